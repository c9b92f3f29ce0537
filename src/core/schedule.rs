//! Day window evaluation.
//!
//! The day window is the half-open interval `[day_start, day_end)` of local
//! time. When `day_start >= day_end` the window wraps past midnight, so equal
//! bounds cover the whole day: a schedule with identical start and end is
//! always day.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::common::constants::MINUTES_PER_DAY;
use crate::core::mode::Mode;
use crate::time::of_day::{Clamped, TimeOfDay};

/// Decide whether `now` falls inside the day window.
///
/// All arguments are minutes since local midnight in `[0, 1440)`.
pub fn is_day_time(now: u16, day_start: u16, day_end: u16) -> bool {
    debug_assert!(now < MINUTES_PER_DAY && day_start < MINUTES_PER_DAY && day_end < MINUTES_PER_DAY);

    if day_start < day_end {
        now >= day_start && now < day_end
    } else {
        now >= day_start || now < day_end
    }
}

/// When the day window starts and ends, and whether the clock drives the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    day_start: TimeOfDay,
    day_end: TimeOfDay,
    auto_switch: bool,
}

impl ScheduleConfig {
    pub fn new(day_start: TimeOfDay, day_end: TimeOfDay, auto_switch: bool) -> Self {
        Self {
            day_start,
            day_end,
            auto_switch,
        }
    }

    pub fn day_start(&self) -> TimeOfDay {
        self.day_start
    }

    pub fn day_end(&self) -> TimeOfDay {
        self.day_end
    }

    pub fn auto_switch(&self) -> bool {
        self.auto_switch
    }

    pub fn set_auto_switch(&mut self, enabled: bool) {
        self.auto_switch = enabled;
    }

    pub fn set_window(&mut self, day_start: TimeOfDay, day_end: TimeOfDay) {
        self.day_start = day_start;
        self.day_end = day_end;
    }

    /// Update the window from text, clamping out-of-range fields.
    ///
    /// Malformed text leaves the current window untouched. Returns true when
    /// either boundary had to be clamped.
    pub fn set_window_from_str(&mut self, day_start: &str, day_end: &str) -> Result<bool> {
        let Clamped {
            value: start,
            adjusted: start_adjusted,
        } = TimeOfDay::parse_clamped(day_start)?;
        let Clamped {
            value: end,
            adjusted: end_adjusted,
        } = TimeOfDay::parse_clamped(day_end)?;
        self.set_window(start, end);
        Ok(start_adjusted || end_adjusted)
    }

    /// Identical bounds: the wrapped window covers all 24 hours.
    pub fn is_always_day(&self) -> bool {
        self.day_start == self.day_end
    }

    pub fn is_day_at(&self, now: TimeOfDay) -> bool {
        is_day_time(now.minutes(), self.day_start.minutes(), self.day_end.minutes())
    }

    /// The mode the schedule selects at `now`.
    pub fn target_mode(&self, now: TimeOfDay) -> Mode {
        if self.is_day_at(now) {
            Mode::Day
        } else {
            Mode::Night
        }
    }

    /// The next boundary after `now` and the mode it switches to.
    ///
    /// Returns `None` for an always-day schedule, which never switches.
    pub fn next_switch(&self, now: TimeOfDay) -> Option<(TimeOfDay, Mode)> {
        if self.is_always_day() {
            return None;
        }
        Some(match self.target_mode(now) {
            Mode::Day => (self.day_end, Mode::Night),
            Mode::Night => (self.day_start, Mode::Day),
        })
    }

    /// Length of the day window in minutes.
    pub fn day_length_minutes(&self) -> u16 {
        if self.is_always_day() {
            MINUTES_PER_DAY
        } else {
            self.day_start.minutes_until(self.day_end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_non_wrapping_window_boundaries() {
        // 06:00-18:00
        assert!(!is_day_time(359, 360, 1080));
        assert!(is_day_time(360, 360, 1080));
        assert!(is_day_time(1079, 360, 1080));
        assert!(!is_day_time(1080, 360, 1080));
    }

    #[test]
    fn test_wrapping_window_boundaries() {
        // 18:00-06:00, crossing midnight
        assert!(!is_day_time(1079, 1080, 360));
        assert!(is_day_time(1080, 1080, 360));
        assert!(is_day_time(0, 1080, 360));
        assert!(is_day_time(359, 1080, 360));
        assert!(!is_day_time(360, 1080, 360));
    }

    #[test]
    fn test_equal_bounds_always_day() {
        for now in [0, 1, 719, 720, 721, 1439] {
            assert!(is_day_time(now, 720, 720));
        }
        let schedule = ScheduleConfig::new(t("12:00"), t("12:00"), true);
        assert!(schedule.is_always_day());
        assert_eq!(schedule.next_switch(t("03:00")), None);
        assert_eq!(schedule.day_length_minutes(), MINUTES_PER_DAY);
    }

    #[test]
    fn test_target_mode() {
        let schedule = ScheduleConfig::new(t("06:00"), t("18:00"), true);
        assert_eq!(schedule.target_mode(t("10:00")), Mode::Day);
        assert_eq!(schedule.target_mode(t("23:00")), Mode::Night);
    }

    #[test]
    fn test_next_switch() {
        let schedule = ScheduleConfig::new(t("06:00"), t("18:00"), true);
        assert_eq!(
            schedule.next_switch(t("10:00")),
            Some((t("18:00"), Mode::Night))
        );
        assert_eq!(
            schedule.next_switch(t("02:00")),
            Some((t("06:00"), Mode::Day))
        );
        assert_eq!(schedule.day_length_minutes(), 720);
    }

    #[test]
    fn test_set_window_from_str_clamps() {
        let mut schedule = ScheduleConfig::new(t("06:00"), t("18:00"), true);
        let adjusted = schedule.set_window_from_str("07:75", "19:00").unwrap();
        assert!(adjusted);
        assert_eq!(schedule.day_start(), t("07:59"));
        assert_eq!(schedule.day_end(), t("19:00"));
    }

    #[test]
    fn test_set_window_from_str_keeps_last_good_on_malformed() {
        let mut schedule = ScheduleConfig::new(t("06:00"), t("18:00"), true);
        assert!(schedule.set_window_from_str("07:00", "dusk").is_err());
        assert_eq!(schedule.day_start(), t("06:00"));
        assert_eq!(schedule.day_end(), t("18:00"));
    }
}
