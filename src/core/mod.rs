//! Core daemon logic.
//!
//! `Core` owns the scheduler and runs the main loop on a single thread:
//!
//! - Ticks the poll loop once per period against the live clock
//! - Drains signal, CLI and config watcher messages between ticks
//! - Reloads configuration, keeping the last good one on error
//!
//! Nothing else touches the scheduler, so no locking is needed.

pub mod controller;
pub mod mode;
pub mod poll;
pub mod schedule;
pub mod scheduler;

use anyhow::Result;
use chrono::{DateTime, Local};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::{
    applier::create_applier,
    common::utils,
    config::{self, Config},
    core::{mode::Mode, poll::PollLoop, scheduler::DayNightScheduler},
    io::{
        lock::LockFile,
        signals::{ModeRequest, SignalMessage, SignalState},
    },
    time::{TimeOfDay, source},
};

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub scheduler: DayNightScheduler,
    pub config: Config,
    pub signal_state: SignalState,
    pub debug_enabled: bool,
    /// `None` in simulation runs, which do not take the daemon lock
    pub lock: Option<LockFile>,
    pub poll: PollLoop,
}

pub(crate) struct Core {
    scheduler: DayNightScheduler,
    config: Config,
    signal_state: SignalState,
    debug_enabled: bool,
    lock: Option<LockFile>,
    poll: PollLoop,
    /// Simulated sleep still running when a message cut the last wait short
    pending_sleep: Option<JoinHandle<()>>,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            scheduler: params.scheduler,
            config: params.config,
            signal_state: params.signal_state,
            debug_enabled: params.debug_enabled,
            lock: params.lock,
            poll: params.poll,
            pending_sleep: None,
        }
    }

    /// Establish the initial mode, run until shutdown, then clean up.
    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", utils::private_path(&custom_dir));
        }

        log_block_start!(
            "Using {} applier",
            self.scheduler.controller().applier_name()
        );

        let now = source::time_of_day();
        if self.scheduler.initialize(now).is_none() && self.debug_enabled {
            log_pipe!();
            log_debug!("Initial mode already active");
        }
        self.log_next_switch(now);

        self.main_loop()?;

        log_block_start!("Shutting down nightswitch...");
        if let Some(lock) = self.lock.take() {
            lock.release();
        }
        log_end!();

        Ok(())
    }

    fn main_loop(&mut self) -> Result<()> {
        while self.signal_state.is_running()
            && !self.poll.is_cancelled()
            && !source::simulation_ended()
        {
            let tick_start = source::now();
            if self.poll.is_due(tick_start)
                && self
                    .poll
                    .tick(&mut self.scheduler, tick_start)
                    .is_some()
            {
                self.log_next_switch(TimeOfDay::from_time(tick_start.time()));
            }

            let wait = self.poll.remaining(source::now());
            match self.wait_for_message(wait) {
                Ok(message) => self.handle_message(message),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log_pipe!();
                    log_error!("Signal channel disconnected unexpectedly");
                    self.poll.cancel();
                }
            }
        }

        Ok(())
    }

    /// Block until a message arrives or `wait` of clock time passes.
    fn wait_for_message(&mut self, wait: Duration) -> Result<SignalMessage, RecvTimeoutError> {
        if !source::is_simulated() {
            return self.signal_state.signal_receiver.recv_timeout(wait);
        }

        // Simulated sleeps run at the simulation's pace on their own thread
        wait_with_sleeper(
            &self.signal_state.signal_receiver,
            &mut self.pending_sleep,
            || std::thread::spawn(move || source::sleep(wait)),
        )
    }

    pub(crate) fn handle_message(&mut self, message: SignalMessage) {
        match message {
            SignalMessage::Reload | SignalMessage::ConfigChanged => self.reload(),
            SignalMessage::ModeRequest(request) => self.handle_mode_request(request),
            SignalMessage::Shutdown => self.poll.cancel(),
        }
    }

    fn handle_mode_request(&mut self, request: ModeRequest) {
        let now = source::time_of_day();
        let change = match request {
            ModeRequest::Toggle => {
                // Before any mode is known, toggle relative to what the schedule wants
                let fallback = self.scheduler.schedule().target_mode(now);
                Some(self.scheduler.controller_mut().toggle_or(fallback))
            }
            ModeRequest::Set(mode) => self.scheduler.controller_mut().set_mode(mode),
        };

        match change {
            Some(_) if self.scheduler.schedule().auto_switch() => {
                log_indented!("Auto switch is on, the schedule applies again on the next tick");
            }
            Some(_) => {}
            None => {
                log_pipe!();
                log_info!(
                    "Already in {} mode",
                    self.scheduler.current_mode().unwrap_or(Mode::Day)
                );
            }
        }
    }

    /// Reload configuration from disk, keeping the current one if the new one is invalid.
    fn reload(&mut self) {
        let loaded = config::load();
        self.apply_reload(loaded, source::now());
    }

    /// Adopt a freshly loaded configuration at `now`.
    ///
    /// An error or an invalid schedule keeps the current configuration. An
    /// identical one is ignored.
    fn apply_reload(&mut self, loaded: Result<Config>, now: DateTime<Local>) {
        let loaded = loaded.and_then(|new_config| {
            let schedule = new_config.schedule()?;
            Ok((new_config, schedule))
        });

        let (new_config, schedule) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                log_pipe!();
                log_warning!("Configuration reload failed: {e:#}");
                log_indented!("Keeping the previous configuration");
                return;
            }
        };

        if new_config == self.config {
            if self.debug_enabled {
                log_pipe!();
                log_debug!("Configuration unchanged, nothing to reload");
            }
            return;
        }

        let hooks_changed = new_config.theme_command != self.config.theme_command
            || new_config.background_command != self.config.background_command;
        let assignments = new_config.assignments();
        let active_assignment_changed = self.scheduler.current_mode().is_some_and(|mode| {
            assignments.for_mode(mode) != self.scheduler.controller().assignments().for_mode(mode)
        });

        if hooks_changed {
            self.scheduler
                .controller_mut()
                .set_applier(create_applier(&new_config, self.debug_enabled));
        }
        self.scheduler.update_settings(schedule, assignments);
        new_config.log_config();
        self.config = new_config;

        if hooks_changed || active_assignment_changed {
            self.scheduler.controller_mut().refresh();
        }

        // A changed window or re-enabled auto switch applies immediately
        if self.poll.tick(&mut self.scheduler, now).is_some() || schedule.auto_switch() {
            self.log_next_switch(TimeOfDay::from_time(now.time()));
        }
    }

    fn log_next_switch(&self, now: TimeOfDay) {
        let schedule = self.scheduler.schedule();
        if !schedule.auto_switch() {
            log_indented!("Auto switch is off");
            return;
        }
        match schedule.next_switch(now) {
            Some((at, mode)) => log_indented!("Next switch: {} at {}", mode, at),
            None => log_indented!("Day window covers the whole day, no switches scheduled"),
        }
    }
}

/// Wait on `receiver` until a message arrives or the sleeper finishes.
///
/// A sleeper still running when a message arrives is kept in `pending` and
/// waited on by the next call, so each simulated sleep advances the clock once.
fn wait_with_sleeper(
    receiver: &Receiver<SignalMessage>,
    pending: &mut Option<JoinHandle<()>>,
    spawn_sleeper: impl FnOnce() -> JoinHandle<()>,
) -> Result<SignalMessage, RecvTimeoutError> {
    let sleeper = pending.take().unwrap_or_else(spawn_sleeper);
    loop {
        match receiver.recv_timeout(Duration::from_millis(10)) {
            Ok(message) => {
                if !sleeper.is_finished() {
                    *pending = Some(sleeper);
                }
                break Ok(message);
            }
            Err(RecvTimeoutError::Timeout) if sleeper.is_finished() => {
                break Err(RecvTimeoutError::Timeout);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(e) => {
                *pending = Some(sleeper);
                break Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applier::LogApplier;
    use crate::common::logger::Log;
    use crate::core::controller::ModeController;
    use crate::core::mode::Assignments;
    use crate::core::schedule::ScheduleConfig;
    use crate::applier::ModeApplier;
    use crate::config::TimeSpec;
    use crate::core::mode::ModeAssignment;
    use crate::state::MemoryStore;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Applied = Rc<RefCell<Vec<(Mode, ModeAssignment)>>>;

    struct RecordingApplier(Applied);

    impl ModeApplier for RecordingApplier {
        fn apply(&mut self, mode: Mode, assignment: &ModeAssignment) -> anyhow::Result<()> {
            self.0.borrow_mut().push((mode, assignment.clone()));
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 10, hour, minute, 0)
            .single()
            .unwrap()
    }

    fn file_config(auto_switch: bool) -> Config {
        Config {
            auto_switch: Some(auto_switch),
            day_start: Some(TimeSpec::Text("06:00".to_string())),
            day_end: Some(TimeSpec::Text("18:00".to_string())),
            theme_command: None,
            background_command: None,
            day: Some(ModeAssignment::new("Adwaita", "meadow.png")),
            night: Some(ModeAssignment::new("Adwaita-dark", "stars.png")),
        }
    }

    /// A core running `config` with a recording applier and a change counter.
    fn reload_core(config: Config) -> (Core, Applied, Rc<RefCell<usize>>) {
        Log::set_enabled(false);
        let applied: Applied = Rc::default();
        let changes = Rc::new(RefCell::new(0));
        let mut controller = ModeController::new(
            Box::new(RecordingApplier(Rc::clone(&applied))),
            Box::new(MemoryStore::new()),
            config.assignments(),
        );
        let counter = Rc::clone(&changes);
        controller.on_change(move |_| *counter.borrow_mut() += 1);

        let core = Core::new(CoreParams {
            scheduler: DayNightScheduler::new(config.schedule().unwrap(), controller),
            config,
            signal_state: SignalState::detached(),
            debug_enabled: false,
            lock: None,
            poll: PollLoop::default(),
        });
        (core, applied, changes)
    }

    fn core(auto_switch: bool) -> Core {
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
        Core::new(CoreParams {
            scheduler: DayNightScheduler::new(schedule, controller),
            config: Config::default(),
            signal_state: SignalState::detached(),
            debug_enabled: false,
            lock: None,
            poll: PollLoop::default(),
        })
    }

    #[test]
    fn test_set_request_switches_mode() {
        let mut core = core(false);
        core.handle_message(SignalMessage::ModeRequest(ModeRequest::Set(Mode::Night)));
        assert_eq!(core.scheduler.current_mode(), Some(Mode::Night));
    }

    #[test]
    fn test_toggle_request_before_initialization_uses_schedule() {
        let mut core = core(false);
        core.handle_message(SignalMessage::ModeRequest(ModeRequest::Toggle));
        let expected = core
            .scheduler
            .schedule()
            .target_mode(source::time_of_day())
            .opposite();
        assert_eq!(core.scheduler.current_mode(), Some(expected));
    }

    #[test]
    fn test_shutdown_cancels_poll_loop() {
        let mut core = core(true);
        core.handle_message(SignalMessage::Shutdown);
        assert!(core.poll.is_cancelled());

        core.main_loop().unwrap();
        assert_eq!(core.scheduler.current_mode(), None);
    }

    #[test]
    fn test_reload_error_keeps_previous_config() {
        let (mut core, applied, _) = reload_core(file_config(true));
        core.scheduler.controller_mut().set_mode(Mode::Day);
        applied.borrow_mut().clear();

        core.apply_reload(Err(anyhow::anyhow!("expected `=`")), at(21, 0));

        let broken = Config {
            day_start: Some(TimeSpec::Text("noon".to_string())),
            ..file_config(false)
        };
        core.apply_reload(Ok(broken), at(21, 0));

        assert_eq!(core.config, file_config(true));
        assert!(core.scheduler.schedule().auto_switch());
        assert_eq!(core.scheduler.schedule().day_start().to_string(), "06:00");
        assert_eq!(core.scheduler.current_mode(), Some(Mode::Day));
        assert!(applied.borrow().is_empty());
    }

    #[test]
    fn test_reload_unchanged_config_is_ignored() {
        let (mut core, applied, changes) = reload_core(file_config(true));

        // A tick would switch to night here, so nothing applied means nothing ran
        core.apply_reload(Ok(file_config(true)), at(21, 0));

        assert_eq!(core.scheduler.current_mode(), None);
        assert!(applied.borrow().is_empty());
        assert_eq!(*changes.borrow(), 0);
        assert!(core.poll.is_due(at(21, 0)));
    }

    #[test]
    fn test_reload_changed_active_assignment_refreshes_without_change() {
        let (mut core, applied, changes) = reload_core(file_config(false));
        core.scheduler.controller_mut().set_mode(Mode::Night);
        applied.borrow_mut().clear();
        *changes.borrow_mut() = 0;

        let updated = Config {
            night: Some(ModeAssignment::new("Nord", "aurora.png")),
            ..file_config(false)
        };
        core.apply_reload(Ok(updated), at(12, 0));

        assert_eq!(
            *applied.borrow(),
            vec![(Mode::Night, ModeAssignment::new("Nord", "aurora.png"))]
        );
        assert_eq!(*changes.borrow(), 0);
        assert_eq!(core.scheduler.current_mode(), Some(Mode::Night));
    }

    #[test]
    fn test_reload_inactive_assignment_change_does_not_refresh() {
        let (mut core, applied, _) = reload_core(file_config(false));
        core.scheduler.controller_mut().set_mode(Mode::Night);
        applied.borrow_mut().clear();

        let updated = Config {
            day: Some(ModeAssignment::new("Nord-light", "dunes.png")),
            ..file_config(false)
        };
        core.apply_reload(Ok(updated), at(12, 0));

        assert!(applied.borrow().is_empty());
        assert_eq!(
            core.scheduler.controller().assignments().day,
            ModeAssignment::new("Nord-light", "dunes.png")
        );
    }

    #[test]
    fn test_reload_changed_hooks_replace_applier_without_change() {
        let (mut core, _, changes) = reload_core(file_config(false));
        core.scheduler.controller_mut().set_mode(Mode::Day);
        *changes.borrow_mut() = 0;

        let updated = Config {
            theme_command: Some("true {theme}".to_string()),
            ..file_config(false)
        };
        core.apply_reload(Ok(updated), at(12, 0));

        assert_eq!(core.scheduler.controller().applier_name(), "command");
        assert_eq!(*changes.borrow(), 0);
        assert_eq!(core.scheduler.current_mode(), Some(Mode::Day));
    }

    #[test]
    fn test_reload_enabling_auto_switch_ticks_immediately() {
        let (mut core, applied, changes) = reload_core(file_config(false));
        core.scheduler.controller_mut().set_mode(Mode::Day);
        applied.borrow_mut().clear();
        *changes.borrow_mut() = 0;

        core.apply_reload(Ok(file_config(true)), at(21, 0));

        assert_eq!(core.scheduler.current_mode(), Some(Mode::Night));
        assert_eq!(applied.borrow().len(), 1);
        assert_eq!(*changes.borrow(), 1);
        assert!(!core.poll.is_due(at(21, 0)));
    }

    #[test]
    fn test_interrupted_sleeper_is_reused_by_next_wait() {
        let state = SignalState::detached();
        let started = Arc::new(AtomicUsize::new(0));
        let mut pending = None;

        let spawn = |started: Arc<AtomicUsize>| {
            move || {
                started.fetch_add(1, Ordering::SeqCst);
                std::thread::spawn(|| std::thread::sleep(Duration::from_millis(200)))
            }
        };

        state.signal_sender.send(SignalMessage::Reload).unwrap();
        let first = wait_with_sleeper(
            &state.signal_receiver,
            &mut pending,
            spawn(Arc::clone(&started)),
        );
        assert!(matches!(first, Ok(SignalMessage::Reload)));
        assert!(pending.is_some());

        let second = wait_with_sleeper(
            &state.signal_receiver,
            &mut pending,
            spawn(Arc::clone(&started)),
        );
        assert!(matches!(second, Err(RecvTimeoutError::Timeout)));
        assert!(pending.is_none());
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }
}
