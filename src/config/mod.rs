//! Configuration for nightswitch.
//!
//! Settings live in `nightswitch.toml` under `$XDG_CONFIG_HOME/nightswitch/`
//! (or the directory passed with `--config`). Every field is optional:
//!
//! ```toml
//! #[Schedule]
//! auto_switch = true       # Follow the day window automatically
//! day_start = "06:00"      # Start of the day window (HH:MM or an hour 0-23)
//! day_end = "18:00"        # End of the day window (HH:MM or an hour 0-23)
//!
//! #[Hooks]
//! theme_command = "gsettings set org.gnome.desktop.interface gtk-theme {theme}"
//! background_command = "swww img {background}"
//!
//! [day]
//! theme = "Adwaita"
//! background = "~/Pictures/meadow.png"
//!
//! [night]
//! theme = "Adwaita-dark"
//! background = "~/Pictures/stars.png"
//! ```
//!
//! `day_start` may be later than `day_end`, in which case the day window wraps
//! past midnight. Equal values mean the day window covers the whole day.
//!
//! Out-of-range hours and minutes are clamped with a warning. Text that is
//! not a time at all is an error.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::common::constants::*;
use crate::core::mode::{Assignments, ModeAssignment};
use crate::core::schedule::ScheduleConfig;
use crate::time::of_day::{Clamped, TimeOfDay};

pub use builder::{create_default_config, update_config_value};
pub use loading::{
    get_config_path, get_custom_config_dir, load, load_from_path, parse_config, set_config_dir,
};
pub use watcher::start_config_watcher;

/// A schedule boundary as written in the file.
///
/// Either a bare hour (`day_start = 7`) or a time string (`"07:30"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSpec {
    Hour(i64),
    Text(String),
}

impl TimeSpec {
    /// Resolve to a time of day, clamping out-of-range parts.
    pub fn resolve(&self) -> Result<Clamped> {
        match self {
            TimeSpec::Hour(hour) => Ok(TimeOfDay::from_hour(*hour)),
            TimeSpec::Text(text) => TimeOfDay::parse_clamped(text),
        }
    }
}

impl std::fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeSpec::Hour(hour) => write!(f, "{hour}"),
            TimeSpec::Text(text) => write!(f, "\"{text}\""),
        }
    }
}

impl From<TimeOfDay> for TimeSpec {
    fn from(value: TimeOfDay) -> Self {
        TimeSpec::Text(value.to_string())
    }
}

/// Configuration loaded from `nightswitch.toml`.
///
/// After [`loading::load_from_path`] every field is populated; `None` only
/// appears in configs built by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub auto_switch: Option<bool>,
    pub day_start: Option<TimeSpec>,
    pub day_end: Option<TimeSpec>,
    /// Shell command run with the mode's theme, e.g. `"set-theme {theme}"`.
    pub theme_command: Option<String>,
    /// Shell command run with the mode's background.
    pub background_command: Option<String>,
    pub day: Option<ModeAssignment>,
    pub night: Option<ModeAssignment>,
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    /// The schedule described by this config, with defaults for missing fields.
    pub fn schedule(&self) -> Result<ScheduleConfig> {
        let day_start = match &self.day_start {
            Some(spec) => spec.resolve()?.value,
            None => TimeOfDay::parse_clamped(DEFAULT_DAY_START)?.value,
        };
        let day_end = match &self.day_end {
            Some(spec) => spec.resolve()?.value,
            None => TimeOfDay::parse_clamped(DEFAULT_DAY_END)?.value,
        };
        Ok(ScheduleConfig::new(
            day_start,
            day_end,
            self.auto_switch.unwrap_or(DEFAULT_AUTO_SWITCH),
        ))
    }

    pub fn assignments(&self) -> Assignments {
        Assignments {
            day: self.day.clone().unwrap_or_default(),
            night: self.night.clone().unwrap_or_default(),
        }
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        match self.schedule() {
            Ok(schedule) => {
                log_indented!(
                    "Auto switch: {}",
                    if schedule.auto_switch() { "on" } else { "off" }
                );
                if schedule.is_always_day() {
                    log_indented!("Day window: always day ({})", schedule.day_start());
                } else {
                    log_indented!(
                        "Day window: {} - {}",
                        schedule.day_start(),
                        schedule.day_end()
                    );
                }
            }
            Err(e) => log_indented!("Day window: invalid ({e})"),
        }

        let assignments = self.assignments();
        for (label, assignment) in [("Day", &assignments.day), ("Night", &assignments.night)] {
            if assignment.is_empty() {
                log_indented!("{label}: no overrides");
            } else {
                log_indented!(
                    "{label}: theme {}, background {}",
                    assignment.theme_override().unwrap_or("(unchanged)"),
                    assignment.background_override().unwrap_or("(unchanged)")
                );
            }
        }

        let hooks: Vec<&str> = [
            self.theme_command.as_deref().filter(|c| !c.trim().is_empty()).map(|_| "theme"),
            self.background_command
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .map(|_| "background"),
        ]
        .into_iter()
        .flatten()
        .collect();
        if hooks.is_empty() {
            log_indented!("Hooks: none");
        } else {
            log_indented!("Hooks: {}", hooks.join(", "));
        }
    }
}

#[cfg(test)]
mod tests;
