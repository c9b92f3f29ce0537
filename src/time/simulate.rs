//! Setup for `--simulate` runs.
//!
//! Installs an accelerated [`SimulatedTimeSource`] so the daemon's main loop
//! walks through a whole schedule in seconds. Everything downstream reads the
//! clock through `time::source`, so nothing else needs to know.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;

use crate::common::constants::DEFAULT_SIMULATION_MULTIPLIER;
use crate::common::logger::{Log, LoggerGuard};
use crate::io::instance::get_running_instance_pid;
use crate::time::source::{self, SimulatedTimeSource};

/// Resources that must outlive the simulated run.
pub struct SimulationGuards {
    logger_guard: Option<LoggerGuard>,
    log_to_file: bool,
    is_complete: bool,
}

impl SimulationGuards {
    /// Flush file logging and print the completion marker on the terminal.
    pub fn complete_simulation(&mut self) {
        self.is_complete = true;

        if self.log_to_file {
            drop(self.logger_guard.take());
            // Let the writer thread drain
            std::thread::sleep(Duration::from_millis(100));

            println!("┣ Simulation complete");
            println!("╹");
        }
    }
}

impl Drop for SimulationGuards {
    fn drop(&mut self) {
        if !self.is_complete && self.log_to_file {
            drop(self.logger_guard.take());
            std::thread::sleep(Duration::from_millis(100));

            println!("┣ Simulation interrupted");
            println!("╹");
        }
    }
}

/// Resolve the CLI multiplier: absent means the default, `0` fast-forwards.
pub fn effective_multiplier(multiplier: Option<f64>) -> f64 {
    match multiplier {
        None => DEFAULT_SIMULATION_MULTIPLIER,
        Some(m) if m <= 0.0 => 0.0,
        Some(m) => m,
    }
}

/// Validate the time range and install the simulated clock.
pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    multiplier: Option<f64>,
    debug_enabled: bool,
    log_to_file: bool,
) -> Result<SimulationGuards> {
    if let Ok(pid) = get_running_instance_pid() {
        log_version!();
        log_block_start!("Simulation Mode");
        log_pipe!();
        log_error!("Cannot run simulation: nightswitch is already running (PID: {pid})");
        log_indented!("Stop it first with: nightswitch stop");
        anyhow::bail!("nightswitch is already running");
    }

    let start = source::parse_datetime(start_time)
        .map_err(|e| anyhow::anyhow!("Invalid start time: {e}"))?;
    let end =
        source::parse_datetime(end_time).map_err(|e| anyhow::anyhow!("Invalid end time: {e}"))?;

    if end <= start {
        anyhow::bail!("End time must be after start time");
    }

    let multiplier = effective_multiplier(multiplier);
    let sim_source = Arc::new(SimulatedTimeSource::new(start, end, multiplier));

    let logger_guard = if log_to_file {
        // Terminal header before the clock is installed, so it carries no timestamps
        log_version!();
        log_block_start!("Simulation Mode");
        log_simulation_details(start, end, multiplier);

        let log_filename = format!(
            "nightswitch-simulation-{}.log",
            Local::now().format("%Y%m%d-%H%M%S")
        );
        log_block_start!("Logging simulation output to: {log_filename}");

        source::init_time_source(sim_source);
        Some(Log::start_file_logging(log_filename)?)
    } else {
        source::init_time_source(sim_source);
        None
    };

    log_version!();
    log_block_start!("Simulation Mode");
    log_simulation_details(start, end, multiplier);
    log_indented!("Running simulation...");

    if debug_enabled {
        log_pipe!();
        log_debug!("Simulated time source initialized");
    }

    Ok(SimulationGuards {
        logger_guard,
        log_to_file,
        is_complete: false,
    })
}

fn log_simulation_details(start: DateTime<Local>, end: DateTime<Local>, multiplier: f64) {
    let duration = end.signed_duration_since(start);

    log_decorated!(
        "Simulating from {} to {}",
        start.format("%Y-%m-%d %H:%M:%S"),
        end.format("%Y-%m-%d %H:%M:%S")
    );
    log_indented!(
        "Total simulated time: {} hours {} minutes",
        duration.num_hours(),
        duration.num_minutes() % 60
    );

    if multiplier == 0.0 {
        log_indented!("Time acceleration: fast-forward");
    } else {
        log_indented!(
            "Time acceleration: {}x (about {:.1} seconds)",
            multiplier as u64,
            duration.num_milliseconds() as f64 / 1000.0 / multiplier
        );
    }
}
