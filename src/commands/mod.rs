//! Command-line command handlers for nightswitch.
//!
//! Each one-shot command lives in its own submodule. Commands that talk to
//! the daemon find it through the lock file and send it a signal; `auto`
//! edits the config file and lets the daemon's watcher pick it up.

pub mod auto;
pub mod help;
pub mod reload;
pub mod status;
pub mod stop;
pub mod toggle;

use anyhow::Result;

use crate::io::instance::get_running_instance_pid;

/// PID of the running daemon, or an error telling the user how to start one.
pub(crate) fn require_running_instance() -> Result<u32> {
    match get_running_instance_pid() {
        Ok(pid) => Ok(pid),
        Err(_) => {
            log_pipe!();
            log_indented!("Start the daemon first with: nightswitch");
            anyhow::bail!("nightswitch isn't running")
        }
    }
}
