//! Main application entry point and high-level flow coordination.
//!
//! Parses the command line and dispatches to the daemon or to a one-shot
//! command:
//!
//! - No command: run the daemon (`Nightswitch::new(debug).run()`)
//! - `--simulate`: run the daemon against an accelerated clock, without the
//!   lock and with in-memory state
//! - `toggle`, `switch`, `status`, `reload`, `stop`, `auto`, `help`: handled
//!   by `commands`
//!
//! Errors from any path are printed once, here, and turn into a non-zero
//! exit code.

use anyhow::Result;

use nightswitch::{
    Nightswitch,
    args::{self, CliAction, ParsedArgs},
    commands,
    common::constants::{EXIT_FAILURE, EXIT_SUCCESS},
    config, log_error_exit, log_pipe,
    time::{simulate, source},
};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let code = match dispatch(parsed_args.action) {
        Ok(code) => code,
        Err(e) => {
            log_pipe!();
            log_error_exit!("{e:#}");
            EXIT_FAILURE
        }
    };

    std::process::exit(code);
}

/// Use `dir` for this process. The daemon always pins the directory; client
/// commands leave it open so they can adopt the running daemon's.
fn apply_config_dir(dir: Option<String>, pin_default: bool) -> Result<()> {
    if dir.is_some() || pin_default {
        config::set_config_dir(dir)?;
    }
    Ok(())
}

fn dispatch(action: CliAction) -> Result<i32> {
    match action {
        CliAction::ShowVersion => args::display_version_info(),
        CliAction::ShowHelp => args::display_help(),
        CliAction::ShowHelpDueToError => {
            args::display_help();
            return Ok(EXIT_FAILURE);
        }
        CliAction::ShowCommandUsage { command } => commands::help::show_command_usage(command),
        CliAction::Help { command } => commands::help::run_help_command(command.as_deref())?,
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            apply_config_dir(config_dir, true)?;
            Nightswitch::new(debug_enabled).run()?;
        }
        CliAction::Toggle {
            debug_enabled,
            config_dir,
        } => {
            apply_config_dir(config_dir, false)?;
            commands::toggle::handle_toggle_command(debug_enabled)?;
        }
        CliAction::Switch {
            debug_enabled,
            mode,
            config_dir,
        } => {
            apply_config_dir(config_dir, false)?;
            commands::toggle::handle_switch_command(mode, debug_enabled)?;
        }
        CliAction::Status { json, config_dir } => {
            apply_config_dir(config_dir, false)?;
            commands::status::handle_status_command(json)?;
        }
        CliAction::Reload {
            debug_enabled,
            config_dir,
        } => {
            apply_config_dir(config_dir, false)?;
            commands::reload::handle_reload_command(debug_enabled)?;
        }
        CliAction::Stop {
            debug_enabled,
            config_dir,
        } => {
            apply_config_dir(config_dir, false)?;
            commands::stop::handle_stop_command(debug_enabled)?;
        }
        CliAction::Auto {
            enabled,
            config_dir,
        } => {
            apply_config_dir(config_dir, false)?;
            commands::auto::handle_auto_command(enabled)?;
        }
        CliAction::Simulate {
            debug_enabled,
            start_time,
            end_time,
            multiplier,
            log_to_file,
            config_dir,
        } => {
            apply_config_dir(config_dir, true)?;

            // Keep the guards alive for the duration of the simulation
            let mut simulation_guards = simulate::handle_simulate_command(
                &start_time,
                &end_time,
                multiplier,
                debug_enabled,
                log_to_file,
            )?;

            Nightswitch::new(debug_enabled)
                .without_lock()
                .without_headers()
                .with_memory_store()
                .run()?;

            // An interrupted run is reported by the guards' Drop instead
            if source::simulation_ended() {
                simulation_guards.complete_simulation();
            }
        }
    }

    Ok(EXIT_SUCCESS)
}
