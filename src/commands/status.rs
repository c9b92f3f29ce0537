//! Status command - report the last recorded mode and the schedule.
//!
//! Reads the state file the daemon writes, so it works whether or not the
//! daemon is running. Supports JSON and human-readable output.

use anyhow::Result;
use serde::Serialize;

use crate::common::constants::STORE_KEY_MODE;
use crate::config::{self, Config};
use crate::core::mode::Mode;
use crate::io::instance::get_running_instance;
use crate::state::{self, SettingsStore};
use crate::time::{TimeOfDay, source};

/// Everything `nightswitch status` reports.
#[derive(Debug, Serialize, PartialEq)]
pub struct StatusReport {
    /// PID of the running daemon
    pub pid: Option<u32>,
    /// Last mode the daemon applied
    pub mode: Option<Mode>,
    pub auto_switch: bool,
    pub day_start: String,
    pub day_end: String,
    /// Mode the schedule selects at `now`
    pub scheduled_mode: Mode,
    pub next_switch: Option<NextSwitch>,
    pub now: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct NextSwitch {
    pub at: String,
    pub mode: Mode,
    pub in_minutes: u16,
}

impl StatusReport {
    /// Build a report from the loaded config and state store at `now`.
    pub fn collect(
        config: &Config,
        store: &dyn SettingsStore,
        now: TimeOfDay,
        pid: Option<u32>,
    ) -> Result<Self> {
        let schedule = config.schedule()?;

        // An unreadable mode entry reads as unknown
        let mode = store
            .load(STORE_KEY_MODE)?
            .and_then(|value| serde_json::from_value::<Mode>(value).ok());

        let next_switch = schedule.next_switch(now).map(|(at, mode)| NextSwitch {
            at: at.to_string(),
            mode,
            in_minutes: now.minutes_until(at),
        });

        Ok(Self {
            pid,
            mode,
            auto_switch: schedule.auto_switch(),
            day_start: schedule.day_start().to_string(),
            day_end: schedule.day_end().to_string(),
            scheduled_mode: schedule.target_mode(now),
            next_switch,
            now: now.to_string(),
        })
    }
}

/// Handle the status command.
pub fn handle_status_command(json: bool) -> Result<()> {
    // Adopts the daemon's config directory when it was started with --config
    let pid = get_running_instance().ok().flatten().map(|info| info.pid);

    let config = config::load()?;
    let store = state::open_default_store()?;
    let report = StatusReport::collect(&config, &store, source::time_of_day(), pid)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_human_readable(&report);
    }
    Ok(())
}

fn display_human_readable(report: &StatusReport) {
    match report.pid {
        Some(pid) => println!("        Daemon: running (PID {pid})"),
        None => println!("        Daemon: not running"),
    }
    match report.mode {
        Some(mode) => println!("  Current mode: {mode}"),
        None => println!("  Current mode: unknown"),
    }
    println!(
        "   Auto switch: {}",
        if report.auto_switch { "on" } else { "off" }
    );
    if report.day_start == report.day_end {
        println!("    Day window: always day");
    } else {
        println!(
            "    Day window: {} - {}",
            report.day_start, report.day_end
        );
    }
    println!(
        "Scheduled mode: {} (at {})",
        report.scheduled_mode, report.now
    );
    if let Some(next) = &report.next_switch {
        println!(
            "   Next switch: {} at {} (in {})",
            next.mode,
            next.at,
            format_minutes(next.in_minutes)
        );
    }
}

/// Format a minute count as `"2h 5m"` / `"45m"`.
fn format_minutes(minutes: u16) -> String {
    let hours = minutes / 60;
    let minutes = minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Display usage help for the status command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightswitch status [--json]");
    log_block_start!("Description:");
    log_indented!("Show the last applied mode and the schedule");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightswitch help status");
    log_end!();
}

/// Display detailed help for the status command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("status - Show the current mode and schedule");
    log_block_start!("Usage: nightswitch status [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-j, --json   Print the report as JSON");
    log_block_start!("Description:");
    log_indented!("Reports the mode the daemon last applied, the configured day");
    log_indented!("window, the mode the schedule selects right now and when the");
    log_indented!("next switch happens. Works when the daemon is stopped too.");
    log_block_start!("Examples:");
    log_indented!("nightswitch status");
    log_indented!("nightswitch status --json | jq .mode");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeSpec;
    use crate::state::MemoryStore;
    use serde_json::json;

    fn config(day_start: &str, day_end: &str) -> Config {
        Config {
            day_start: Some(TimeSpec::Text(day_start.to_string())),
            day_end: Some(TimeSpec::Text(day_end.to_string())),
            ..Config::default()
        }
    }

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_report_reads_persisted_mode() {
        let mut store = MemoryStore::new();
        store.persist(STORE_KEY_MODE, json!("night")).unwrap();

        let report =
            StatusReport::collect(&config("06:00", "18:00"), &store, t("10:30"), Some(42)).unwrap();

        assert_eq!(report.pid, Some(42));
        assert_eq!(report.mode, Some(Mode::Night));
        assert_eq!(report.scheduled_mode, Mode::Day);
        assert!(report.auto_switch);
        assert_eq!(
            report.next_switch,
            Some(NextSwitch {
                at: "18:00".to_string(),
                mode: Mode::Night,
                in_minutes: 450,
            })
        );
    }

    #[test]
    fn test_report_unknown_mode_when_nothing_persisted() {
        let store = MemoryStore::new();
        let report =
            StatusReport::collect(&config("20:00", "04:00"), &store, t("23:00"), None).unwrap();

        assert_eq!(report.mode, None);
        assert_eq!(report.pid, None);
        assert_eq!(report.scheduled_mode, Mode::Day);
        assert_eq!(report.next_switch.as_ref().map(|n| n.mode), Some(Mode::Night));
    }

    #[test]
    fn test_report_ignores_garbage_mode_entry() {
        let mut store = MemoryStore::new();
        store.persist(STORE_KEY_MODE, json!(17)).unwrap();

        let report =
            StatusReport::collect(&config("06:00", "18:00"), &store, t("10:30"), None).unwrap();
        assert_eq!(report.mode, None);
    }

    #[test]
    fn test_report_always_day_has_no_next_switch() {
        let store = MemoryStore::new();
        let report =
            StatusReport::collect(&config("07:00", "07:00"), &store, t("02:00"), None).unwrap();
        assert_eq!(report.scheduled_mode, Mode::Day);
        assert_eq!(report.next_switch, None);
    }

    #[test]
    fn test_report_json_shape() {
        let store = MemoryStore::new();
        let report =
            StatusReport::collect(&config("06:00", "18:00"), &store, t("05:00"), None).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["scheduled_mode"], json!("night"));
        assert_eq!(value["mode"], json!(null));
        assert_eq!(value["next_switch"]["mode"], json!("day"));
        assert_eq!(value["next_switch"]["in_minutes"], json!(60));
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(125), "2h 5m");
    }
}
