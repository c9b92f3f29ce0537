//! Implementation of the toggle and switch commands.
//!
//! Both send a mode request to the running daemon, which applies it on its
//! main thread between schedule checks.

use anyhow::Result;

use crate::common::constants::DEFAULT_AUTO_SWITCH;
use crate::config;
use crate::core::mode::Mode;
use crate::io::instance::send_mode_request;
use crate::io::signals::ModeRequest;

/// Ask the running daemon to flip to the other mode.
pub fn handle_toggle_command(debug_enabled: bool) -> Result<()> {
    send_request(ModeRequest::Toggle, debug_enabled)
}

/// Ask the running daemon to switch to `mode`.
pub fn handle_switch_command(mode: Mode, debug_enabled: bool) -> Result<()> {
    send_request(ModeRequest::Set(mode), debug_enabled)
}

fn send_request(request: ModeRequest, debug_enabled: bool) -> Result<()> {
    log_version!();

    let pid = super::require_running_instance()?;

    match request {
        ModeRequest::Toggle => log_block_start!("Toggling mode..."),
        ModeRequest::Set(mode) => log_block_start!("Switching to {mode}..."),
    }

    send_mode_request(pid, request)?;
    log_decorated!("Sent request to nightswitch (PID: {pid})");

    if debug_enabled {
        log_pipe!();
        log_debug!("SIGUSR1 sent to process {pid} with request '{}'", request.as_str());
    }

    // A manual change only lasts until the next schedule check when auto switching is on
    if let Ok(config) = config::load()
        && config.auto_switch.unwrap_or(DEFAULT_AUTO_SWITCH)
    {
        log_pipe!();
        log_warning!("Automatic switching is on, the next schedule check may revert this");
        log_indented!("Turn it off with: nightswitch auto off");
    }

    log_end!();
    Ok(())
}

/// Display usage help for the toggle command (--help flag)
pub fn show_toggle_usage() {
    log_version!();
    log_block_start!("Usage: nightswitch toggle");
    log_block_start!("Description:");
    log_indented!("Flip the running daemon to the other mode");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightswitch help toggle");
    log_end!();
}

/// Display detailed help for the toggle command (help subcommand)
pub fn display_toggle_help() {
    log_version!();
    log_block_start!("toggle - Flip between day and night");
    log_block_start!("Usage: nightswitch toggle");
    log_block_start!("Description:");
    log_indented!("Asks the running daemon to apply the opposite of its current mode.");
    log_indented!("Before the first mode is known the daemon toggles away from the");
    log_indented!("mode the schedule would pick right now.");
    log_pipe!();
    log_indented!("With automatic switching on, the next schedule check (within a");
    log_indented!("minute) may switch back. Use 'nightswitch auto off' to keep it.");
    log_block_start!("Examples:");
    log_indented!("# Flip the current mode");
    log_indented!("nightswitch toggle");
    log_pipe!();
    log_indented!("# Flip the daemon started with a custom config directory");
    log_indented!("nightswitch --config ~/.config/nightswitch-work toggle");
    log_end!();
}

/// Display usage help for the switch command (--help flag)
pub fn show_switch_usage() {
    log_version!();
    log_block_start!("Usage: nightswitch switch <day|night>");
    log_block_start!("Description:");
    log_indented!("Switch the running daemon to a specific mode");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightswitch help switch");
    log_end!();
}

/// Display detailed help for the switch command (help subcommand)
pub fn display_switch_help() {
    log_version!();
    log_block_start!("switch - Apply a specific mode");
    log_block_start!("Usage: nightswitch switch <day|night>");
    log_block_start!("Arguments:");
    log_indented!("day, d     Apply the [day] theme and background");
    log_indented!("night, n   Apply the [night] theme and background");
    log_block_start!("Description:");
    log_indented!("Nothing happens if the daemon is already in the requested mode.");
    log_block_start!("Examples:");
    log_indented!("nightswitch switch night");
    log_indented!("nightswitch s day");
    log_end!();
}
