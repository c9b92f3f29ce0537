//! Configuration loading functionality.
//!
//! Handles locating the configuration file, creating a default one on first
//! run, and the read → validate → apply defaults pipeline.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::validation::validate_config;
use super::{Config, TimeSpec};
use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::core::mode::ModeAssignment;

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
/// Returns an error if already set.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
/// Returns None if using the default directory.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of `nightswitch.toml` for this process.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Directory containing `nightswitch.toml`.
pub fn get_config_base_dir() -> Result<PathBuf> {
    let config_path = get_config_path()?;
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Load configuration using automatic path detection.
///
/// Creates a commented default configuration file if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
        log_block_start!(
            "Created default configuration at {}",
            private_path(&config_path)
        );
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load configuration from a specific path.
///
/// This version does NOT create a default config if the path doesn't exist.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found at {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    parse_config(&content)
        .with_context(|| format!("Invalid configuration in {}", private_path(path)))
}

/// Parse, validate and normalize configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content).context("Failed to parse TOML")?;

    validate_config(&config)?;
    apply_defaults_and_modifications(&mut config)?;

    Ok(config)
}

/// Apply default values to configuration fields.
fn apply_defaults(config: &mut Config) {
    if config.auto_switch.is_none() {
        config.auto_switch = Some(DEFAULT_AUTO_SWITCH);
    }
    if config.day_start.is_none() {
        config.day_start = Some(TimeSpec::Text(DEFAULT_DAY_START.to_string()));
    }
    if config.day_end.is_none() {
        config.day_end = Some(TimeSpec::Text(DEFAULT_DAY_END.to_string()));
    }
    if config.theme_command.is_none() {
        config.theme_command = Some(String::new());
    }
    if config.background_command.is_none() {
        config.background_command = Some(String::new());
    }
    if config.day.is_none() {
        config.day = Some(ModeAssignment::default());
    }
    if config.night.is_none() {
        config.night = Some(ModeAssignment::default());
    }
}

/// Normalize both schedule boundaries to `"HH:MM"`, clamping out-of-range values.
fn apply_modifications(config: &mut Config) -> Result<()> {
    for (field, slot) in [
        ("day_start", &mut config.day_start),
        ("day_end", &mut config.day_end),
    ] {
        let Some(spec) = slot.as_ref() else {
            continue;
        };
        let resolved = spec.resolve()?;
        if resolved.adjusted {
            log_pipe!();
            log_warning!("{field} = {spec} is out of range, using \"{}\"", resolved.value);
        }
        *slot = Some(TimeSpec::from(resolved.value));
    }

    if config.day_start.is_some() && config.day_start == config.day_end {
        log_pipe!();
        log_warning!("day_start equals day_end, it will always be day");
    }

    Ok(())
}

/// Apply default values and field modifications to the configuration.
/// All validation is handled by validation::validate_config.
pub(crate) fn apply_defaults_and_modifications(config: &mut Config) -> Result<()> {
    apply_defaults(config);
    apply_modifications(config)?;
    Ok(())
}
