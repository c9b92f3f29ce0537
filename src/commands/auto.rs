//! Implementation of the auto command.
//!
//! Writes `auto_switch` to the config file. A running daemon notices the
//! change through its config watcher; no signal is needed.

use anyhow::Result;
use std::path::Path;

use crate::config::{self, create_default_config, update_config_value};
use crate::io::instance::get_running_instance;

/// Handle `nightswitch auto <on|off>`.
pub fn handle_auto_command(enabled: bool) -> Result<()> {
    log_version!();

    // Adopts the daemon's config directory when it was started with --config
    let running = get_running_instance().ok().flatten();

    let config_path = config::get_config_path()?;
    set_auto_switch(&config_path, enabled)?;

    log_block_start!(
        "Automatic switching {}",
        if enabled { "enabled" } else { "disabled" }
    );
    log_indented!(
        "Updated {}",
        crate::common::utils::private_path(&config_path)
    );

    match running {
        Some(info) => log_indented!("nightswitch (PID: {}) will pick up the change", info.pid),
        None => log_indented!("Takes effect the next time nightswitch starts"),
    }

    log_end!();
    Ok(())
}

/// Set `auto_switch` in the config file at `path`, creating the file if needed.
pub fn set_auto_switch(path: &Path, enabled: bool) -> Result<()> {
    if !path.exists() {
        create_default_config(path)?;
    }
    update_config_value(path, "auto_switch", if enabled { "true" } else { "false" })
}

/// Display usage help for the auto command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: nightswitch auto <on|off>");
    log_block_start!("Description:");
    log_indented!("Turn automatic day/night switching on or off");
    log_pipe!();
    log_info!("For detailed help with examples, try: nightswitch help auto");
    log_end!();
}

/// Display detailed help for the auto command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("auto - Turn automatic switching on or off");
    log_block_start!("Usage: nightswitch auto <on|off>");
    log_block_start!("Description:");
    log_indented!("Sets auto_switch in nightswitch.toml. With it on, the daemon checks");
    log_indented!("the schedule every minute and applies the mode it selects. With it");
    log_indented!("off, the mode only changes through toggle and switch.");
    log_pipe!();
    log_indented!("Turning it on applies the scheduled mode within a minute.");
    log_block_start!("Examples:");
    log_indented!("# Keep a manual choice");
    log_indented!("nightswitch auto off");
    log_indented!("nightswitch switch night");
    log_pipe!();
    log_indented!("# Follow the schedule again");
    log_indented!("nightswitch auto on");
    log_end!();
}
