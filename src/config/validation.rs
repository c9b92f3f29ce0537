//! Configuration validation functionality.
//!
//! Rejects values that cannot be interpreted at all. Values that are merely
//! out of range are clamped later in `loading`, not rejected here.

use anyhow::{Context, Result};

use super::{Config, TimeSpec};
use crate::common::constants::{PLACEHOLDER_BACKGROUND, PLACEHOLDER_MODE, PLACEHOLDER_THEME};
use crate::core::mode::ModeAssignment;

/// Validate a freshly parsed configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(spec) = &config.day_start {
        validate_time_spec(spec, "day_start")?;
    }
    if let Some(spec) = &config.day_end {
        validate_time_spec(spec, "day_end")?;
    }

    for (label, assignment) in [("day", &config.day), ("night", &config.night)] {
        if let Some(assignment) = assignment {
            validate_assignment(assignment, label)?;
        }
    }

    warn_about_unused_hooks(config);

    Ok(())
}

fn validate_time_spec(spec: &TimeSpec, field: &str) -> Result<()> {
    spec.resolve()
        .with_context(|| format!("{field} = {spec} is not a valid time. Use \"HH:MM\" or an hour (0-23)"))?;
    Ok(())
}

fn validate_assignment(assignment: &ModeAssignment, label: &str) -> Result<()> {
    for (field, value) in [
        ("theme", &assignment.theme),
        ("background", &assignment.background),
    ] {
        if value.contains('\n') || value.contains('\0') {
            anyhow::bail!("[{label}] {field} must be a single line");
        }
    }
    Ok(())
}

/// A configured hook that no mode can ever feed is almost certainly a mistake.
fn warn_about_unused_hooks(config: &Config) {
    let day = config.day.clone().unwrap_or_default();
    let night = config.night.clone().unwrap_or_default();

    let theme_hook = config.theme_command.as_deref().unwrap_or("").trim();
    if !theme_hook.is_empty() && day.theme.is_empty() && night.theme.is_empty() {
        log_pipe!();
        log_warning!("theme_command is set but neither [day] nor [night] has a theme");
    }

    let background_hook = config.background_command.as_deref().unwrap_or("").trim();
    if !background_hook.is_empty() && day.background.is_empty() && night.background.is_empty() {
        log_pipe!();
        log_warning!("background_command is set but neither [day] nor [night] has a background");
    }

    for (field, hook) in [
        ("theme_command", theme_hook),
        ("background_command", background_hook),
    ] {
        let uses_value = [PLACEHOLDER_MODE, PLACEHOLDER_THEME, PLACEHOLDER_BACKGROUND]
            .iter()
            .any(|p| hook.contains(p))
            || hook.contains("NIGHTSWITCH_");
        if !hook.is_empty() && !uses_value {
            log_pipe!();
            log_warning!("{field} does not reference {{theme}}, {{background}} or {{mode}}");
            log_indented!("It will run with the same arguments in both modes");
        }
    }
}
