//! Day/night modes and the presentation bound to each.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two mutually exclusive presentation states.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Day,
    Night,
}

impl Mode {
    /// The other mode.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Day => Self::Night,
            Self::Night => Self::Day,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }

    /// Returns the icon/symbol for this mode.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Day => "󰖨 ",
            Self::Night => " ",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Day => write!(f, "Day"),
            Mode::Night => write!(f, "Night"),
        }
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "d" => Ok(Mode::Day),
            "night" | "n" => Ok(Mode::Night),
            other => anyhow::bail!("Unknown mode '{other}' (expected 'day' or 'night')"),
        }
    }
}

/// Theme and background applied for one mode.
///
/// An empty identifier means "leave this part of the presentation alone".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeAssignment {
    pub theme: String,
    pub background: String,
}

impl ModeAssignment {
    pub fn new(theme: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            background: background.into(),
        }
    }

    pub fn theme_override(&self) -> Option<&str> {
        Some(self.theme.as_str()).filter(|t| !t.is_empty())
    }

    pub fn background_override(&self) -> Option<&str> {
        Some(self.background.as_str()).filter(|b| !b.is_empty())
    }

    /// True when neither theme nor background is overridden.
    pub fn is_empty(&self) -> bool {
        self.theme.is_empty() && self.background.is_empty()
    }
}

/// The assignment for each mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignments {
    pub day: ModeAssignment,
    pub night: ModeAssignment,
}

impl Assignments {
    pub fn for_mode(&self, mode: Mode) -> &ModeAssignment {
        match mode {
            Mode::Day => &self.day,
            Mode::Night => &self.night,
        }
    }
}

/// Notification that the active mode actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    /// `None` when the mode was still unknown (first assignment).
    pub from: Option<Mode>,
    pub to: Mode,
}

impl fmt::Display for ModeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from {
            Some(from) => write!(f, "{from} → {}", self.to),
            None => write!(f, "{}", self.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("day".parse::<Mode>().unwrap(), Mode::Day);
        assert_eq!(" Night ".parse::<Mode>().unwrap(), Mode::Night);
        assert_eq!("n".parse::<Mode>().unwrap(), Mode::Night);
        assert!("dusk".parse::<Mode>().is_err());
    }

    #[test]
    fn test_opposite_is_involutive() {
        assert_eq!(Mode::Day.opposite(), Mode::Night);
        assert_eq!(Mode::Day.opposite().opposite(), Mode::Day);
    }

    #[test]
    fn test_assignment_overrides() {
        let a = ModeAssignment::new("Adwaita-dark", "");
        assert_eq!(a.theme_override(), Some("Adwaita-dark"));
        assert_eq!(a.background_override(), None);
        assert!(!a.is_empty());
        assert!(ModeAssignment::default().is_empty());
    }

    #[test]
    fn test_mode_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Night).unwrap(), "\"night\"");
        let m: Mode = serde_json::from_str("\"day\"").unwrap();
        assert_eq!(m, Mode::Day);
    }

    #[test]
    fn test_mode_change_display() {
        let first = ModeChange {
            from: None,
            to: Mode::Day,
        };
        assert_eq!(first.to_string(), "Day");
        let flip = ModeChange {
            from: Some(Mode::Day),
            to: Mode::Night,
        };
        assert_eq!(flip.to_string(), "Day → Night");
    }
}
