//! Application entry point for the nightswitch daemon.
//!
//! `Nightswitch` wires configuration, persistence, the applier and the
//! scheduler together and hands them to the core main loop.
//!
//! ```no_run
//! use nightswitch::Nightswitch;
//!
//! // Normal daemon startup
//! Nightswitch::new(false).run()?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Simulation runs skip the lock and keep state in memory so they never
//! interfere with a real instance:
//!
//! ```no_run
//! # use nightswitch::Nightswitch;
//! Nightswitch::new(true)
//!     .without_lock()
//!     .without_headers()
//!     .with_memory_store()
//!     .run()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result};

use crate::{
    applier::create_applier,
    config::{self, Config},
    core::{
        Core, CoreParams, controller::ModeController, poll::PollLoop,
        scheduler::DayNightScheduler,
    },
    io::{instance::ensure_single_instance, signals::setup_signal_handler},
    state::{self, MemoryStore, SettingsStore},
};

/// Builder for configuring and running the daemon.
pub struct Nightswitch {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
    memory_store: bool,
}

impl Nightswitch {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
            memory_store: false,
        }
    }

    /// Run without taking the single-instance lock.
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Skip the version header (the caller already printed one).
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Keep persisted state in memory instead of the state file.
    pub fn with_memory_store(mut self) -> Self {
        self.memory_store = true;
        self
    }

    /// Run until a shutdown signal arrives or a simulation ends.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        let config = Config::load().context("Configuration failed")?;
        let schedule = config.schedule()?;

        let store: Box<dyn SettingsStore> = if self.memory_store {
            Box::new(MemoryStore::new())
        } else {
            Box::new(state::open_default_store()?)
        };

        let lock = if self.create_lock {
            Some(ensure_single_instance()?)
        } else {
            None
        };

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        if let Err(e) =
            config::start_config_watcher(signal_state.signal_sender.clone(), self.debug_enabled)
        {
            log_pipe!();
            log_warning!("Config file watching unavailable: {e}");
            log_indented!("Hot config reload disabled, use 'nightswitch reload' instead");
        }

        config.log_config();

        let mut controller = ModeController::new(
            create_applier(&config, self.debug_enabled),
            store,
            config.assignments(),
        );
        if self.debug_enabled {
            controller.on_change(|change| {
                log_pipe!();
                log_debug!("Mode change recorded: {change}");
            });
        }

        if lock.is_some() {
            log_block_start!("Lock acquired, starting nightswitch...");
        }

        let core = Core::new(CoreParams {
            scheduler: DayNightScheduler::new(schedule, controller),
            config,
            signal_state,
            debug_enabled: self.debug_enabled,
            lock,
            poll: PollLoop::default(),
        });

        core.execute()
    }
}
