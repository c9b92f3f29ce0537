//! Implementation of the reload command.
//!
//! Validates the configuration first, then signals the running daemon to
//! re-read it. The daemon keeps its previous settings if the file it reads
//! turns out to be invalid.

use anyhow::{Context, Result};

use crate::config;
use crate::io::instance::send_reload_signal;

/// Handle the reload command.
pub fn handle_reload_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    // Find the daemon first so its config directory is adopted before loading
    let pid = super::require_running_instance()?;

    // Fail fast with a clear error instead of leaving the daemon on old settings silently
    let config = config::load().context("Configuration is invalid, not reloading")?;
    if debug_enabled {
        config.log_config();
    }

    log_block_start!("Signaling nightswitch to reload...");
    send_reload_signal(pid)?;
    log_decorated!("Sent reload signal to nightswitch (PID: {pid})");

    log_block_start!("Reload requested");
    log_end!();
    Ok(())
}

/// Display usage help for the reload command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightswitch reload");
    log_block_start!("Description:");
    log_indented!("Reload configuration in the running daemon");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightswitch help reload");
    log_end!();
}

/// Display detailed help for the reload command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("reload - Reload configuration");
    log_block_start!("Usage: nightswitch reload");
    log_block_start!("Description:");
    log_indented!("Checks nightswitch.toml and asks the running daemon to apply it.");
    log_indented!("The daemon also reloads on its own when the file changes, so this");
    log_indented!("is mostly useful after editing through a symlink or network mount.");
    log_block_start!("Process:");
    log_indented!("1. Locates the running nightswitch process");
    log_indented!("2. Validates the configuration file");
    log_indented!("3. Sends SIGUSR2 so the daemon re-reads it");
    log_block_start!("Examples:");
    log_indented!("# Basic reload");
    log_indented!("nightswitch reload");
    log_pipe!();
    log_indented!("# Reload with debug output");
    log_indented!("nightswitch --debug reload");
    log_end!();
}
