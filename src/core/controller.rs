//! The mode state machine.
//!
//! `ModeController` owns the current mode and is the only place that talks to
//! the applier and the settings store. Every transition goes through
//! [`ModeController::set_mode`], which makes repeated requests for the active
//! mode free: no applier call, no write, no notification.

use anyhow::{Result, anyhow};
use serde_json::json;

use crate::applier::ModeApplier;
use crate::common::constants::STORE_KEY_MODE;
use crate::core::mode::{Assignments, Mode, ModeAssignment, ModeChange};
use crate::core::schedule::ScheduleConfig;
use crate::state::SettingsStore;
use crate::time::TimeOfDay;

/// A collaborator call that failed during a transition.
///
/// The controller keeps the new mode regardless; this is only reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorFailure {
    Apply { mode: Mode, message: String },
    Persist { key: String, message: String },
}

impl std::fmt::Display for CollaboratorFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollaboratorFailure::Apply { mode, message } => {
                write!(f, "Failed to apply {mode} mode: {message}")
            }
            CollaboratorFailure::Persist { key, message } => {
                write!(f, "Failed to persist '{key}': {message}")
            }
        }
    }
}

pub type ChangeObserver = Box<dyn FnMut(&ModeChange)>;
pub type FailureObserver = Box<dyn FnMut(&CollaboratorFailure)>;

pub struct ModeController {
    current: Option<Mode>,
    assignments: Assignments,
    applier: Box<dyn ModeApplier>,
    store: Box<dyn SettingsStore>,
    on_change: Option<ChangeObserver>,
    on_failure: Option<FailureObserver>,
}

impl ModeController {
    /// Create a controller whose mode is still unknown.
    pub fn new(
        applier: Box<dyn ModeApplier>,
        store: Box<dyn SettingsStore>,
        assignments: Assignments,
    ) -> Self {
        Self {
            current: None,
            assignments,
            applier,
            store,
            on_change: None,
            on_failure: None,
        }
    }

    pub fn current_mode(&self) -> Option<Mode> {
        self.current
    }

    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    /// Replace the assignments. Takes effect on the next transition.
    pub fn set_assignments(&mut self, assignments: Assignments) {
        self.assignments = assignments;
    }

    /// Swap the applier, e.g. after hook commands changed on reload.
    pub fn set_applier(&mut self, applier: Box<dyn ModeApplier>) {
        self.applier = applier;
    }

    pub fn applier_name(&self) -> &'static str {
        self.applier.name()
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn SettingsStore {
        self.store.as_mut()
    }

    /// Register the callback invoked once per actual mode change.
    pub fn on_change(&mut self, observer: impl FnMut(&ModeChange) + 'static) {
        self.on_change = Some(Box::new(observer));
    }

    /// Register the callback invoked when the applier or store fails.
    pub fn on_failure(&mut self, observer: impl FnMut(&CollaboratorFailure) + 'static) {
        self.on_failure = Some(Box::new(observer));
    }

    /// Transition to `target`.
    ///
    /// Returns `None` without touching any collaborator when `target` is
    /// already active. Otherwise the mode is updated before the applier runs,
    /// and stays updated even if applying or persisting fails.
    pub fn set_mode(&mut self, target: Mode) -> Option<ModeChange> {
        if self.current == Some(target) {
            return None;
        }

        let change = ModeChange {
            from: self.current,
            to: target,
        };
        self.current = Some(target);

        log_block_start!("{} Switching to {}", target.symbol(), change);

        let assignment: ModeAssignment = self.assignments.for_mode(target).clone();
        if let Err(e) = self.applier.apply(target, &assignment) {
            self.report(CollaboratorFailure::Apply {
                mode: target,
                message: format!("{e:#}"),
            });
        }

        self.record(STORE_KEY_MODE, json!(target));

        if let Some(observer) = self.on_change.as_mut() {
            observer(&change);
        }

        Some(change)
    }

    /// Re-run the applier for the current mode without a transition.
    ///
    /// Used when the active mode's assignment or the applier itself changed.
    /// Nothing is persisted and no change is reported.
    pub fn refresh(&mut self) {
        let Some(mode) = self.current else {
            return;
        };
        let assignment = self.assignments.for_mode(mode).clone();
        if let Err(e) = self.applier.apply(mode, &assignment) {
            self.report(CollaboratorFailure::Apply {
                mode,
                message: format!("{e:#}"),
            });
        }
    }

    /// Switch to the opposite of the current mode.
    ///
    /// Fails when no mode has been established yet; use
    /// [`toggle_or`](Self::toggle_or) to supply one.
    pub fn toggle(&mut self) -> Result<ModeChange> {
        let current = self
            .current
            .ok_or_else(|| anyhow!("Cannot toggle before a mode has been established"))?;
        Ok(self.flip_from(current))
    }

    /// Switch to the opposite of the current mode, treating an unknown
    /// mode as `fallback`.
    pub fn toggle_or(&mut self, fallback: Mode) -> ModeChange {
        let current = self.current.unwrap_or(fallback);
        self.flip_from(current)
    }

    fn flip_from(&mut self, current: Mode) -> ModeChange {
        let target = current.opposite();
        // `target` never equals the active mode here, so set_mode always reports a change
        self.set_mode(target).unwrap_or(ModeChange {
            from: self.current,
            to: target,
        })
    }

    /// Apply whatever mode the schedule selects at `now`.
    pub fn evaluate_and_apply(
        &mut self,
        now: TimeOfDay,
        schedule: &ScheduleConfig,
    ) -> Option<ModeChange> {
        self.set_mode(schedule.target_mode(now))
    }

    /// Persist `value` under `key`, reporting rather than returning a failure.
    pub fn record(&mut self, key: &str, value: serde_json::Value) {
        if let Err(e) = self.store.persist(key, value) {
            self.report(CollaboratorFailure::Persist {
                key: key.to_string(),
                message: format!("{e:#}"),
            });
        }
    }

    fn report(&mut self, failure: CollaboratorFailure) {
        log_pipe!();
        log_warning!("{failure}");
        if let Some(observer) = self.on_failure.as_mut() {
            observer(&failure);
        }
    }
}
