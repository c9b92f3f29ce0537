//! Clock abstraction for real and simulated time.
//!
//! Every clock read in nightswitch goes through [`now`], so the poll loop can be
//! driven by an accelerated clock during `--simulate` runs without any change to
//! the scheduling code.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use crate::time::of_day::TimeOfDay;

/// Global time source, defaults to [`RealTimeSource`] on first use.
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Source of wall-clock time.
pub trait TimeSource: Send + Sync {
    /// Current local time.
    fn now(&self) -> DateTime<Local>;

    /// Sleep for `duration` of this source's time.
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;

    /// Whether a simulation reached its end time. Always false for real time.
    fn is_ended(&self) -> bool {
        false
    }
}

/// The system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Accelerated clock running from `start` to `end`.
///
/// With a positive multiplier, sleeping `d` takes `d / multiplier` of real time.
/// A multiplier of `0.0` fast-forwards: sleeps advance the clock immediately.
pub struct SimulatedTimeSource {
    end: DateTime<Local>,
    multiplier: f64,
    current: Mutex<DateTime<Local>>,
}

impl SimulatedTimeSource {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>, multiplier: f64) -> Self {
        Self {
            end,
            multiplier: multiplier.max(0.0),
            current: Mutex::new(start),
        }
    }

    fn current(&self) -> DateTime<Local> {
        match self.current.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn advance(&self, by: ChronoDuration) {
        let mut guard = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = (*guard + by).min(self.end);
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Local> {
        self.current()
    }

    fn sleep(&self, duration: StdDuration) {
        let remaining = self.end - self.current();
        if remaining <= ChronoDuration::zero() {
            return;
        }
        let requested = ChronoDuration::from_std(duration).unwrap_or(remaining);
        let step = requested.min(remaining);

        if self.multiplier > 0.0 {
            let real_secs = step.num_milliseconds() as f64 / 1000.0 / self.multiplier;
            std::thread::sleep(StdDuration::from_secs_f64(real_secs));
        } else {
            // Yield so log output keeps up with the fast-forwarded clock
            std::thread::sleep(StdDuration::from_millis(1));
        }

        self.advance(step);
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.current() >= self.end
    }
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource))
}

/// Install the global time source. Only the first call has an effect.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Whether a time source was installed or lazily created.
pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

pub fn now() -> DateTime<Local> {
    source().now()
}

/// Current local time of day, minute resolution.
pub fn time_of_day() -> TimeOfDay {
    TimeOfDay::from_time(now().time())
}

pub fn sleep(duration: StdDuration) {
    source().sleep(duration)
}

pub fn is_simulated() -> bool {
    source().is_simulated()
}

pub fn simulation_ended() -> bool {
    source().is_ended()
}

/// Parse `"YYYY-MM-DD HH:MM:SS"` as a local date and time.
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;
    Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| "Ambiguous or invalid local time".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(s: &str) -> DateTime<Local> {
        parse_datetime(s).unwrap()
    }

    #[test]
    fn test_fast_forward_advances_by_requested_duration() {
        let source = SimulatedTimeSource::new(
            local("2026-03-01 05:58:00"),
            local("2026-03-01 07:00:00"),
            0.0,
        );
        source.sleep(StdDuration::from_secs(60));
        assert_eq!(source.now(), local("2026-03-01 05:59:00"));
        assert!(!source.is_ended());
    }

    #[test]
    fn test_simulation_caps_at_end_time() {
        let source = SimulatedTimeSource::new(
            local("2026-03-01 05:58:00"),
            local("2026-03-01 06:00:00"),
            0.0,
        );
        source.sleep(StdDuration::from_secs(3600));
        assert_eq!(source.now(), local("2026-03-01 06:00:00"));
        assert!(source.is_ended());

        // Further sleeps are no-ops
        source.sleep(StdDuration::from_secs(60));
        assert_eq!(source.now(), local("2026-03-01 06:00:00"));
    }

    #[test]
    fn test_parse_datetime_rejects_bad_format() {
        assert!(parse_datetime("2026-03-01 25:00:00").is_err());
        assert!(parse_datetime("06:00").is_err());
    }
}
