//! `DayNightScheduler` ties the schedule to the mode controller.

use serde_json::json;

use crate::common::constants::{STORE_KEY_DAY, STORE_KEY_MODE, STORE_KEY_NIGHT, STORE_KEY_SCHEDULE};
use crate::core::controller::ModeController;
use crate::core::mode::{Assignments, Mode, ModeChange};
use crate::core::schedule::ScheduleConfig;
use crate::time::TimeOfDay;

pub struct DayNightScheduler {
    schedule: ScheduleConfig,
    controller: ModeController,
}

impl DayNightScheduler {
    pub fn new(schedule: ScheduleConfig, controller: ModeController) -> Self {
        Self {
            schedule,
            controller,
        }
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ModeController {
        &mut self.controller
    }

    pub fn current_mode(&self) -> Option<Mode> {
        self.controller.current_mode()
    }

    /// Mode to establish at startup.
    ///
    /// With auto-switch on this is what the schedule says for `now`. Otherwise
    /// the last persisted mode is restored, and `Day` is used when nothing
    /// usable was stored.
    pub fn resolve_initial_mode(&self, now: TimeOfDay) -> Mode {
        if self.schedule.auto_switch() {
            return self.schedule.target_mode(now);
        }

        match self.controller.store().load(STORE_KEY_MODE) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|_| {
                log_warning!("Ignoring unrecognized stored mode, starting in day mode");
                Mode::Day
            }),
            Ok(None) => Mode::Day,
            Err(e) => {
                log_warning!("Could not read last mode: {e:#}");
                Mode::Day
            }
        }
    }

    /// Record the active settings and establish the first mode.
    pub fn initialize(&mut self, now: TimeOfDay) -> Option<ModeChange> {
        self.persist_settings();
        let target = self.resolve_initial_mode(now);
        self.controller.set_mode(target)
    }

    /// Snapshot the schedule and both assignments into the store.
    pub fn persist_settings(&mut self) {
        let schedule = json!(self.schedule);
        let day = json!(self.controller.assignments().day);
        let night = json!(self.controller.assignments().night);
        self.controller.record(STORE_KEY_SCHEDULE, schedule);
        self.controller.record(STORE_KEY_DAY, day);
        self.controller.record(STORE_KEY_NIGHT, night);
    }

    pub fn evaluate_and_apply(&mut self, now: TimeOfDay) -> Option<ModeChange> {
        self.controller.evaluate_and_apply(now, &self.schedule)
    }

    pub fn set_auto_switch(&mut self, enabled: bool) {
        self.schedule.set_auto_switch(enabled);
    }

    /// Replace the schedule and assignments and record them.
    ///
    /// The active mode is not touched; the next tick decides.
    pub fn update_settings(&mut self, schedule: ScheduleConfig, assignments: Assignments) {
        self.schedule = schedule;
        self.controller.set_assignments(assignments);
        self.persist_settings();
    }
}
