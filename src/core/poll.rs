//! Fixed-period schedule polling.
//!
//! The loop never accumulates elapsed time. Each tick reads the clock it is
//! given, and the next deadline is one period after the tick began, so a
//! tick that runs late is simply late rather than followed by catch-up ticks.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::common::constants::POLL_INTERVAL;
use crate::core::mode::ModeChange;
use crate::core::scheduler::DayNightScheduler;
use crate::time::TimeOfDay;

pub struct PollLoop {
    interval: Duration,
    cancelled: Arc<AtomicBool>,
    next_due: Option<DateTime<Local>>,
}

impl Default for PollLoop {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}

impl PollLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cancelled: Arc::new(AtomicBool::new(false)),
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one evaluation at `now`.
    ///
    /// Does nothing after [`cancel`](Self::cancel) or while auto-switch is
    /// disabled. With auto-switch disabled the deadline still advances, so
    /// re-enabling it takes effect on the next tick.
    pub fn tick(
        &mut self,
        scheduler: &mut DayNightScheduler,
        now: DateTime<Local>,
    ) -> Option<ModeChange> {
        if self.is_cancelled() {
            return None;
        }

        self.next_due = Some(now + self.chrono_interval());

        if !scheduler.schedule().auto_switch() {
            return None;
        }

        scheduler.evaluate_and_apply(TimeOfDay::from_time(now.time()))
    }

    /// True when no tick has run yet or the deadline has passed.
    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        self.next_due.is_none_or(|due| now >= due)
    }

    /// Time left until the next tick, zero when one is due.
    pub fn remaining(&self, now: DateTime<Local>) -> Duration {
        match self.next_due {
            Some(due) => (due - now).to_std().unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }

    /// Stop the loop. No tick has any effect afterwards.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Flag that cancels this loop from another thread.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn chrono_interval(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.interval).unwrap_or(chrono::Duration::seconds(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applier::LogApplier;
    use crate::common::logger::Log;
    use crate::core::controller::ModeController;
    use crate::core::mode::{Assignments, Mode};
    use crate::core::schedule::ScheduleConfig;
    use crate::state::MemoryStore;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 14, hour, minute, 0)
            .single()
            .unwrap()
    }

    fn scheduler(auto_switch: bool) -> DayNightScheduler {
        Log::set_enabled(false);
        let schedule = ScheduleConfig::new(
            TimeOfDay::from_minutes(6 * 60),
            TimeOfDay::from_minutes(18 * 60),
            auto_switch,
        );
        let controller = ModeController::new(
            Box::new(LogApplier),
            Box::new(MemoryStore::new()),
            Assignments::default(),
        );
        DayNightScheduler::new(schedule, controller)
    }

    #[test]
    fn test_tick_applies_schedule() {
        let mut poll = PollLoop::default();
        let mut scheduler = scheduler(true);

        let change = poll.tick(&mut scheduler, at(20, 0)).unwrap();
        assert_eq!(change.to, Mode::Night);
        assert_eq!(poll.tick(&mut scheduler, at(20, 1)), None);
    }

    #[test]
    fn test_tick_ignored_when_auto_switch_off() {
        let mut poll = PollLoop::default();
        let mut scheduler = scheduler(false);
        scheduler.controller_mut().set_mode(Mode::Day);

        assert_eq!(poll.tick(&mut scheduler, at(23, 0)), None);
        assert_eq!(scheduler.controller().current_mode(), Some(Mode::Day));
        // Timer still advanced
        assert!(!poll.is_due(at(23, 0)));
        assert!(poll.is_due(at(23, 1)));
    }

    #[test]
    fn test_enabling_auto_switch_takes_effect_next_tick() {
        let mut poll = PollLoop::default();
        let mut scheduler = scheduler(false);
        scheduler.controller_mut().set_mode(Mode::Day);
        poll.tick(&mut scheduler, at(23, 0));

        scheduler.set_auto_switch(true);
        let change = poll.tick(&mut scheduler, at(23, 1)).unwrap();
        assert_eq!(change.to, Mode::Night);
    }

    #[test]
    fn test_cancelled_tick_has_no_effect() {
        let mut poll = PollLoop::default();
        let mut scheduler = scheduler(true);
        poll.cancel();

        assert_eq!(poll.tick(&mut scheduler, at(12, 0)), None);
        assert_eq!(scheduler.controller().current_mode(), None);
    }

    #[test]
    fn test_deadline_is_one_period_after_tick_start() {
        let mut poll = PollLoop::default();
        let mut scheduler = scheduler(true);
        assert!(poll.is_due(at(12, 0)));

        // A late tick does not schedule catch-up ticks
        poll.tick(&mut scheduler, at(12, 5));
        assert_eq!(poll.remaining(at(12, 5)), POLL_INTERVAL);
        assert_eq!(poll.remaining(at(12, 7)), Duration::ZERO);
    }
}
