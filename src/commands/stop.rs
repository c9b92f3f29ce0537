//! Implementation of the stop command.
//!
//! This command cleanly terminates a running nightswitch instance by sending
//! SIGTERM and waiting for the process to exit.

use anyhow::Result;
use std::time::Duration;

use crate::io::instance::{is_instance_running, terminate_instance};

const STOP_TIMEOUT: Duration = Duration::from_secs(3);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handle the stop command to terminate a running nightswitch instance.
pub fn handle_stop_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let pid = super::require_running_instance()?;
    log_block_start!("Stopping nightswitch instance (PID: {pid})...");

    terminate_instance(pid)?;
    if debug_enabled {
        log_pipe!();
        log_debug!("SIGTERM sent to process {pid}");
    }

    let max_attempts = STOP_TIMEOUT.as_millis() / STOP_POLL_INTERVAL.as_millis();
    for _ in 0..max_attempts {
        if !is_instance_running(pid) {
            log_pipe!();
            log_info!("Process terminated successfully");
            log_end!();
            return Ok(());
        }
        std::thread::sleep(STOP_POLL_INTERVAL);
    }

    log_pipe!();
    log_warning!("Process did not terminate within the expected time");
    log_indented!("The termination signal was sent, but the process may still be shutting down");
    log_end!();
    Ok(())
}

/// Display usage help for the stop command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightswitch stop");
    log_block_start!("Description:");
    log_indented!("Cleanly terminate the running nightswitch instance");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightswitch help stop");
    log_end!();
}

/// Display detailed help for the stop command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("stop - Cleanly terminate running nightswitch");
    log_block_start!("Usage: nightswitch stop");
    log_block_start!("Description:");
    log_indented!("Sends a termination signal to the running nightswitch instance.");
    log_indented!("The current theme and background are left as they are.");
    log_indented!("Waits up to 3 seconds to confirm the process actually terminates.");
    log_block_start!("Examples:");
    log_indented!("# Stop running nightswitch");
    log_indented!("nightswitch stop");
    log_pipe!();
    log_indented!("# Stop with debug output");
    log_indented!("nightswitch --debug stop");
    log_end!();
}
