//! Hook-command applier.
//!
//! Each hook is a shell command template. Placeholders `{mode}`, `{theme}` and
//! `{background}` are replaced with shell-quoted values, and the same values are
//! exported as `NIGHTSWITCH_MODE`, `NIGHTSWITCH_THEME` and
//! `NIGHTSWITCH_BACKGROUND`. A hook only runs when its identifier is non-empty.
//!
//! Hooks are spawned and not awaited. A reaper thread collects the exit status
//! and logs failures.

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

use super::ModeApplier;
use crate::common::constants::{PLACEHOLDER_BACKGROUND, PLACEHOLDER_MODE, PLACEHOLDER_THEME};
use crate::common::utils::shell_quote;
use crate::core::mode::{Mode, ModeAssignment};

pub struct CommandApplier {
    theme_command: Option<String>,
    background_command: Option<String>,
    debug_enabled: bool,
}

impl CommandApplier {
    pub fn new(
        theme_command: Option<String>,
        background_command: Option<String>,
        debug_enabled: bool,
    ) -> Self {
        Self {
            theme_command,
            background_command,
            debug_enabled,
        }
    }

    /// Spawn one hook and hand the child to a reaper thread.
    fn spawn_hook(
        &self,
        label: &'static str,
        command_line: String,
        mode: Mode,
        assignment: &ModeAssignment,
    ) -> Result<()> {
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Running {label} hook: {command_line}");
        }

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&command_line)
            .env("NIGHTSWITCH_MODE", mode.as_str())
            .env("NIGHTSWITCH_THEME", &assignment.theme)
            .env("NIGHTSWITCH_BACKGROUND", &assignment.background)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {label} hook"))?;

        std::thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => {}
            Ok(status) => {
                log_pipe!();
                log_warning!("{label} hook exited with {status}");
                log_indented!("{command_line}");
            }
            Err(e) => {
                log_pipe!();
                log_warning!("Could not wait for {label} hook: {e}");
            }
        });

        Ok(())
    }
}

/// Substitute placeholders in a hook template.
///
/// The template is scanned once, so placeholder tokens inside substituted
/// values stay literal.
pub fn render_command(template: &str, mode: Mode, assignment: &ModeAssignment) -> String {
    let substitutions = [
        (PLACEHOLDER_MODE, mode.as_str()),
        (PLACEHOLDER_THEME, assignment.theme.as_str()),
        (PLACEHOLDER_BACKGROUND, assignment.background.as_str()),
    ];

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start..];
        match substitutions
            .iter()
            .find(|(token, _)| tail.starts_with(token))
        {
            Some((token, value)) => {
                rendered.push_str(&shell_quote(value));
                rest = &tail[token.len()..];
            }
            None => {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

impl ModeApplier for CommandApplier {
    fn apply(&mut self, mode: Mode, assignment: &ModeAssignment) -> Result<()> {
        let hooks = [
            (
                "theme",
                self.theme_command.as_deref(),
                assignment.theme_override(),
            ),
            (
                "background",
                self.background_command.as_deref(),
                assignment.background_override(),
            ),
        ];

        // Run every hook even if an earlier one fails, report the first failure
        let mut first_error = None;
        for (label, template, id) in hooks {
            let (Some(template), Some(_)) = (template, id) else {
                continue;
            };
            let command_line = render_command(template, mode, assignment);
            if let Err(e) = self.spawn_hook(label, command_line, mode, assignment) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn wait_for(path: &std::path::Path) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if path.exists() && std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn test_render_command_substitutes_quoted_values() {
        let assignment = ModeAssignment::new("Adwaita-dark", "Night Sky.png");
        let line = render_command(
            "set-theme {theme} && set-bg {background} # {mode}",
            Mode::Night,
            &assignment,
        );
        assert_eq!(
            line,
            "set-theme Adwaita-dark && set-bg 'Night Sky.png' # night"
        );
    }

    #[test]
    fn test_render_command_keeps_placeholders_in_values_literal() {
        let assignment = ModeAssignment::new("x{background}", "; echo injected");
        assert_eq!(
            render_command("set-theme {theme}", Mode::Night, &assignment),
            "set-theme 'x{background}'"
        );

        let assignment = ModeAssignment::new("{mode}", "{theme}");
        assert_eq!(
            render_command("{theme} {background} {mode} {other}", Mode::Day, &assignment),
            "'{mode}' '{theme}' day {other}"
        );
    }

    #[test]
    fn test_apply_runs_hook_with_environment() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("theme.txt");
        let template = format!(
            "printf '%s %s' \"$NIGHTSWITCH_MODE\" {{theme}} > {}",
            out.display()
        );
        let mut applier = CommandApplier::new(Some(template), None, false);

        applier
            .apply(Mode::Night, &ModeAssignment::new("Adwaita-dark", ""))
            .unwrap();

        assert!(wait_for(&out));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "night Adwaita-dark");
    }

    #[test]
    fn test_apply_skips_empty_identifier() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("bg.txt");
        let template = format!("echo {{background}} > {}", out.display());
        let mut applier = CommandApplier::new(None, Some(template), false);

        applier
            .apply(Mode::Day, &ModeAssignment::new("Adwaita", ""))
            .unwrap();

        std::thread::sleep(Duration::from_millis(200));
        assert!(!out.exists());
    }
}
