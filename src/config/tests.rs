use super::builder::{default_config, default_config_content, update_config_value};
use super::validation::validate_config;
use super::*;
use crate::common::constants::test_constants::*;
use crate::common::logger::Log;
use crate::core::mode::Mode;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn create_test_config(day_start: TimeSpec, day_end: TimeSpec) -> Config {
    Config {
        auto_switch: Some(true),
        day_start: Some(day_start),
        day_end: Some(day_end),
        theme_command: Some("set-theme {theme}".to_string()),
        background_command: None,
        day: Some(ModeAssignment::new(TEST_DAY_THEME, TEST_DAY_BACKGROUND)),
        night: Some(ModeAssignment::new(TEST_NIGHT_THEME, TEST_NIGHT_BACKGROUND)),
    }
}

fn text(value: &str) -> TimeSpec {
    TimeSpec::Text(value.to_string())
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    Log::set_enabled(false);
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nightswitch").join("nightswitch.toml");

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config, default_config());
}

#[test]
fn test_default_config_content_parses_to_defaults() {
    let config = parse_config(&default_config_content()).unwrap();
    assert_eq!(config.auto_switch, Some(DEFAULT_AUTO_SWITCH));
    assert_eq!(config.day_start, Some(text(DEFAULT_DAY_START)));
    assert_eq!(config.day_end, Some(text(DEFAULT_DAY_END)));
    assert_eq!(config.assignments(), Assignments::default());
}

#[test]
fn test_config_validation_basic() {
    let config = create_test_config(text(TEST_DAY_START), text(TEST_DAY_END));
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_rejects_malformed_times() {
    for bad in ["noon", "7pm", "12-30", ""] {
        let config = create_test_config(text(bad), text(TEST_DAY_END));
        assert!(validate_config(&config).is_err(), "accepted {bad:?}");
    }
}

#[test]
fn test_config_validation_rejects_multiline_identifiers() {
    let mut config = create_test_config(text(TEST_DAY_START), text(TEST_DAY_END));
    config.night = Some(ModeAssignment::new("Dark\nrm -rf ~", ""));
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_toml_parsing() {
    let content = r#"
auto_switch = false
day_start = "07:30"
day_end = 20
theme_command = "gsettings set org.gnome.desktop.interface gtk-theme {theme}"

[day]
theme = "Adwaita"

[night]
theme = "Adwaita-dark"
background = "stars.png"
"#;
    let config = parse_config(content).unwrap();
    let schedule = config.schedule().unwrap();

    assert!(!schedule.auto_switch());
    assert_eq!(schedule.day_start().to_string(), "07:30");
    assert_eq!(schedule.day_end().to_string(), "20:00");
    assert_eq!(config.day_end, Some(text("20:00")));

    let assignments = config.assignments();
    assert_eq!(assignments.day, ModeAssignment::new("Adwaita", ""));
    assert_eq!(assignments.night.background, "stars.png");
    assert_eq!(config.background_command.as_deref(), Some(""));
}

#[test]
fn test_config_out_of_range_values_are_clamped() {
    Log::set_enabled(false);
    let config = parse_config("day_start = \"25:75\"\nday_end = -3\n").unwrap();
    assert_eq!(config.day_start, Some(text("23:59")));
    assert_eq!(config.day_end, Some(text("00:00")));
}

#[test]
fn test_config_seconds_are_dropped() {
    let config = parse_config("day_start = \"06:30:45\"").unwrap();
    assert_eq!(config.day_start, Some(text("06:30")));
}

#[test]
fn test_config_malformed_toml() {
    assert!(parse_config("day_start = [1, 2]").is_err());
    assert!(parse_config("auto_switch = \"yes\"").is_err());
    assert!(parse_config("day_start = \"sunrise\"").is_err());
}

#[test]
fn test_config_equal_bounds_is_always_day() {
    Log::set_enabled(false);
    let config = parse_config("day_start = 8\nday_end = \"08:00\"").unwrap();
    let schedule = config.schedule().unwrap();
    assert!(schedule.is_always_day());
    assert_eq!(
        schedule.target_mode(crate::time::TimeOfDay::from_minutes(3 * 60)),
        Mode::Day
    );
}

#[test]
fn test_schedule_defaults_for_hand_built_config() {
    let schedule = Config::default().schedule().unwrap();
    assert_eq!(schedule.day_start().to_string(), DEFAULT_DAY_START);
    assert_eq!(schedule.day_end().to_string(), DEFAULT_DAY_END);
    assert_eq!(schedule.auto_switch(), DEFAULT_AUTO_SWITCH);
}

#[test]
fn test_load_from_path_missing_file() {
    let temp_dir = tempdir().unwrap();
    assert!(load_from_path(&temp_dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_update_config_value_preserves_comment() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nightswitch.toml");
    fs::write(&path, default_config_content()).unwrap();

    update_config_value(&path, "auto_switch", "false").unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let line = content
        .lines()
        .find(|l| l.starts_with("auto_switch"))
        .unwrap();
    assert!(line.starts_with("auto_switch = false "));
    assert!(line.contains("# Switch modes automatically"));
    assert_eq!(load_from_path(&path).unwrap().auto_switch, Some(false));
}

#[test]
fn test_update_config_value_adds_missing_key_above_tables() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nightswitch.toml");
    fs::write(&path, "[day]\ntheme = \"Light\"\n").unwrap();

    update_config_value(&path, "auto_switch", "false").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.auto_switch, Some(false));
    assert_eq!(config.assignments().day.theme, "Light");
}

#[test]
fn test_update_config_value_rejects_invalid_value() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nightswitch.toml");
    fs::write(&path, default_config_content()).unwrap();

    assert!(update_config_value(&path, "day_start", "\"dawn\"").is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), default_config_content());
}

#[test]
fn test_find_config_line_ignores_table_keys_and_prefixes() {
    let content = "day_start = \"06:00\"\n[day]\ntheme = \"x\"\n";
    assert!(builder::find_config_line(content, "day").is_none());
    assert!(builder::find_config_line(content, "theme").is_none());
    assert!(builder::find_config_line(content, "day_start").is_some());
}

mod property_tests {
    use super::super::{TimeSpec, parse_config};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_any_integer_hour_loads(start in -1000i64..1000, end in -1000i64..1000) {
            crate::common::logger::Log::set_enabled(false);
            let content = format!("day_start = {start}\nday_end = {end}");
            let config = parse_config(&content).unwrap();
            let schedule = config.schedule().unwrap();
            prop_assert_eq!(u32::from(schedule.day_start().hour()), start.clamp(0, 23) as u32);
            prop_assert_eq!(schedule.day_end().minute(), 0);
        }

        #[test]
        fn test_valid_times_round_trip(hour in 0u16..24, minute in 0u16..60) {
            let content = format!("day_start = \"{hour:02}:{minute:02}\"");
            let config = parse_config(&content).unwrap();
            prop_assert_eq!(
                config.day_start,
                Some(TimeSpec::Text(format!("{hour:02}:{minute:02}")))
            );
        }
    }
}
