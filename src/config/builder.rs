//! Default configuration generation and in-place edits.
//!
//! The generated file keeps settings and their comments aligned in a single
//! column. Edits made by CLI commands replace only the value of a line and
//! keep the user's own spacing and comment.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::{Config, parse_config};
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Write a commented default configuration file to `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content()).context("Failed to write default config file")?;
    Ok(())
}

/// Text of the default configuration file.
pub fn default_config_content() -> String {
    ConfigBuilder::new()
        .add_section("Schedule")
        .add_setting(
            "auto_switch",
            &DEFAULT_AUTO_SWITCH.to_string(),
            "Switch modes automatically following the day window",
        )
        .add_setting(
            "day_start",
            &format!("\"{DEFAULT_DAY_START}\""),
            "Start of the day window (\"HH:MM\" or an hour 0-23)",
        )
        .add_setting(
            "day_end",
            &format!("\"{DEFAULT_DAY_END}\""),
            "End of the day window, may be earlier than day_start",
        )
        .add_section("Hooks")
        .add_setting(
            "theme_command",
            "\"\"",
            "Run on every switch, {theme} is replaced with the mode's theme",
        )
        .add_setting(
            "background_command",
            "\"\"",
            "Run on every switch, {background} is replaced with the mode's background",
        )
        .add_table("day")
        .add_setting("theme", "\"\"", "Theme applied during the day (empty = unchanged)")
        .add_setting(
            "background",
            "\"\"",
            "Background applied during the day (empty = unchanged)",
        )
        .add_table("night")
        .add_setting("theme", "\"\"", "Theme applied at night (empty = unchanged)")
        .add_setting(
            "background",
            "\"\"",
            "Background applied at night (empty = unchanged)",
        )
        .build()
}

/// The configuration a freshly generated file produces.
pub fn default_config() -> Config {
    parse_config(&default_config_content()).unwrap_or_default()
}

/// Replace the value of a top-level setting in the config file at `path`.
///
/// The new value must be valid TOML for that key. The edited file is parsed
/// before it is written, so a bad value never reaches the disk.
pub fn update_config_value(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let updated = match find_config_line(&content, key) {
        Some(line) => content.replacen(&line, &preserve_comment_formatting(&line, key, value), 1),
        None => insert_top_level_setting(&content, &format!("{key} = {value}")),
    };

    parse_config(&updated).with_context(|| format!("Refusing to write {key} = {value}"))?;

    fs::write(path, updated)
        .with_context(|| format!("Failed to write config to {}", private_path(path)))?;
    Ok(())
}

/// Insert a line before the first `[table]` header so it stays top-level.
fn insert_top_level_setting(content: &str, line: &str) -> String {
    let mut lines: Vec<&str> = content.lines().collect();
    let position = lines
        .iter()
        .position(|l| l.trim_start().starts_with('['))
        .unwrap_or(lines.len());
    lines.insert(position, line);
    let mut result = lines.join("\n");
    result.push('\n');
    result
}

/// Builder for creating dynamically-aligned configuration files.
///
/// The comment column is derived from the longest setting line, so changing a
/// default never breaks alignment.
struct ConfigBuilder {
    entries: Vec<EntryType>,
}

enum EntryType {
    Section(String),
    Table(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A comment header grouping the following top-level settings.
    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(EntryType::Section(format!("#[{title}]")));
        self
    }

    /// A real TOML table; all following settings belong to it.
    fn add_table(mut self, name: &str) -> Self {
        self.entries.push(EntryType::Table(format!("[{name}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(EntryType::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                EntryType::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for entry in self.entries {
            match entry {
                EntryType::Section(header) | EntryType::Table(header) => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(header);
                }
                EntryType::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        let mut content = result.join("\n");
        content.push('\n');
        content
    }
}

/// Find the top-level line that assigns `key`.
///
/// Lines inside `[day]`/`[night]` tables are never returned.
pub(crate) fn find_config_line(content: &str, key: &str) -> Option<String> {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            return None;
        }
        let Some(rest) = trimmed.strip_prefix(key) else {
            continue;
        };
        if rest.trim_start().starts_with('=') {
            return Some(line.to_string());
        }
    }
    None
}

/// Replace the value of a config line, keeping the spacing before its comment.
pub(crate) fn preserve_comment_formatting(
    original_line: &str,
    key: &str,
    new_value: &str,
) -> String {
    let key_value_part = format!("{key} = {new_value}");

    if let Some(comment_pos) = original_line.find('#') {
        let comment_part = &original_line[comment_pos..];

        let before_comment = &original_line[..comment_pos];
        let original_spacing =
            if let Some(last_non_space) = before_comment.rfind(|c: char| !c.is_whitespace()) {
                &before_comment[last_non_space + 1..]
            } else {
                " "
            };

        format!("{key_value_part}{original_spacing}{comment_part}")
    } else {
        key_value_part
    }
}
