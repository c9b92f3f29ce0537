//! Application-wide constants and defaults.

use std::time::Duration;

// # Application Metadata
pub const APP_NAME: &str = "nightswitch";
pub const CONFIG_FILE_NAME: &str = "nightswitch.toml";
pub const STATE_FILE_NAME: &str = "state.json";
pub const LOCK_FILE_NAME: &str = "nightswitch.lock";

// # Schedule Defaults
pub const DEFAULT_AUTO_SWITCH: bool = true;
pub const DEFAULT_DAY_START: &str = "06:00";
pub const DEFAULT_DAY_END: &str = "18:00";

// # Time Arithmetic
pub const MINUTES_PER_HOUR: u16 = 60;
pub const MINUTES_PER_DAY: u16 = 24 * MINUTES_PER_HOUR;
pub const MAXIMUM_HOUR: i64 = 23;
pub const MAXIMUM_MINUTE: i64 = 59;

// # Poll Loop
/// Fixed period between schedule evaluations.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

// # Config Watcher
/// Editors often write a file in several steps; coalesce events within this window.
pub const CONFIG_RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

// # Hook Placeholders
pub const PLACEHOLDER_MODE: &str = "{mode}";
pub const PLACEHOLDER_THEME: &str = "{theme}";
pub const PLACEHOLDER_BACKGROUND: &str = "{background}";

// # Persistence Keys
pub const STORE_KEY_MODE: &str = "mode";
pub const STORE_KEY_SCHEDULE: &str = "schedule";
pub const STORE_KEY_DAY: &str = "day";
pub const STORE_KEY_NIGHT: &str = "night";

// # Simulation
/// Default acceleration for `--simulate` when no multiplier is given (1 hour per second).
pub const DEFAULT_SIMULATION_MULTIPLIER: f64 = 3600.0;

// # Exit Codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
