//! Help command implementation for nightswitch.
//!
//! Dispatches `nightswitch help [COMMAND]` and `nightswitch COMMAND --help`
//! to the help text each command module provides.

use anyhow::Result;

/// Brief usage for a command (`nightswitch <command> --help`).
pub fn show_command_usage(command: &str) {
    match command {
        "toggle" => super::toggle::show_toggle_usage(),
        "switch" => super::toggle::show_switch_usage(),
        "status" => super::status::show_usage(),
        "reload" => super::reload::show_usage(),
        "stop" => super::stop::show_usage(),
        "auto" => super::auto::show_usage(),
        _ => crate::args::display_help(),
    }
}

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("toggle") | Some("t") => super::toggle::display_toggle_help(),
        Some("switch") | Some("s") => super::toggle::display_switch_help(),
        Some("status") | Some("st") => super::status::display_help(),
        Some("reload") | Some("r") => super::reload::display_help(),
        Some("stop") => super::stop::display_help(),
        Some("auto") | Some("a") => super::auto::display_help(),
        Some("help") | Some("h") => display_help_help(),
        Some(unknown) => {
            log_version!();
            log_pipe!();
            log_warning!("Unknown command: {unknown}");
            log_end!();
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("toggle, t               Flip the running daemon to the other mode");
    log_indented!("switch, s <day|night>   Switch the running daemon to a mode");
    log_indented!("status, st              Show the last mode and the schedule");
    log_indented!("reload, r               Reload configuration in the running daemon");
    log_indented!("stop                    Stop the running daemon");
    log_indented!("auto, a <on|off>        Turn automatic switching on or off");
    log_indented!("help, h [COMMAND]       Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'nightswitch help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'nightswitch --help' to see all options and general usage.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: nightswitch help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("# Show general help");
    log_indented!("nightswitch help");
    log_pipe!();
    log_indented!("# Show help for specific commands");
    log_indented!("nightswitch help switch");
    log_indented!("nightswitch help auto");
    log_end!();
}
