//! Command-line argument parsing.
//!
//! Turns `argv` into a single [`CliAction`] for `main` to dispatch. Global
//! flags may appear anywhere; the first bare word is the subcommand and the
//! words after it are its arguments. Invalid input is reported with a
//! warning and mapped to [`CliAction::ShowHelpDueToError`].

use crate::core::mode::Mode;
use crate::time::source;

/// What the process was asked to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon in the foreground
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Ask the running daemon to flip to the other mode
    Toggle {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Ask the running daemon to switch to a specific mode
    Switch {
        debug_enabled: bool,
        mode: Mode,
        config_dir: Option<String>,
    },
    /// Print the persisted mode and the schedule
    Status {
        json: bool,
        config_dir: Option<String>,
    },
    /// Ask the running daemon to reload its configuration
    Reload {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Terminate the running daemon
    Stop {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Turn automatic switching on or off in the config file
    Auto {
        enabled: bool,
        config_dir: Option<String>,
    },
    /// Detailed help for one command, or the command list
    Help { command: Option<String> },
    /// Run the daemon against an accelerated clock
    Simulate {
        debug_enabled: bool,
        start_time: String,
        end_time: String,
        /// `None` uses the default acceleration, `Some(0.0)` fast-forwards
        multiplier: Option<f64>,
        log_to_file: bool,
        config_dir: Option<String>,
    },

    /// Brief usage for a command (`nightswitch <command> --help`)
    ShowCommandUsage { command: &'static str },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to invalid arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

/// Arguments collected from `--simulate`.
struct SimulateArgs {
    start_time: String,
    end_time: String,
    multiplier: Option<f64>,
    log_to_file: bool,
}

/// Canonical name of a subcommand or one of its aliases.
fn canonical_command(word: &str) -> Option<&'static str> {
    match word {
        "toggle" | "t" => Some("toggle"),
        "switch" | "s" => Some("switch"),
        "status" | "st" => Some("status"),
        "reload" | "r" => Some("reload"),
        "stop" => Some("stop"),
        "auto" | "a" => Some("auto"),
        "help" | "h" => Some("help"),
        _ => None,
    }
}

fn parse_switch_state(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|arg| arg.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut json = false;
        let mut config_dir: Option<String> = None;
        let mut simulate: Option<SimulateArgs> = None;
        let mut unknown_arg_found = false;
        let mut words: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = &args_vec[i];
            match arg.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--json" | "-j" => json = true,
                "--config" | "-c" => {
                    // Parse: --config <directory>
                    if i + 1 < args_vec.len() && !args_vec[i + 1].starts_with('-') {
                        config_dir = Some(args_vec[i + 1].clone());
                        i += 1;
                    } else {
                        log_warning!("Missing directory for --config. Usage: --config <directory>");
                        unknown_arg_found = true;
                    }
                }
                "--simulate" | "-S" => match parse_simulate(&args_vec, &mut i) {
                    Some(args) => simulate = Some(args),
                    None => unknown_arg_found = true,
                },
                _ if arg.starts_with('-') => {
                    log_warning!("Unknown option: {arg}");
                    unknown_arg_found = true;
                }
                _ => words.push(arg.clone()),
            }
            i += 1;
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else if let Some(sim) = simulate {
            if let Some(word) = words.first() {
                log_warning!("--simulate cannot be combined with '{word}'");
                CliAction::ShowHelpDueToError
            } else if display_help {
                CliAction::ShowHelp
            } else {
                CliAction::Simulate {
                    debug_enabled,
                    start_time: sim.start_time,
                    end_time: sim.end_time,
                    multiplier: sim.multiplier,
                    log_to_file: sim.log_to_file,
                    config_dir,
                }
            }
        } else if let Some((command, rest)) = words.split_first() {
            parse_command(command, rest, display_help, debug_enabled, json, config_dir)
        } else if display_help {
            CliAction::ShowHelp
        } else {
            CliAction::Run {
                debug_enabled,
                config_dir,
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Parse `--simulate <start> <end> [multiplier | --fast-forward] [--log]`.
///
/// `i` points at the flag on entry and at the last consumed argument on return.
fn parse_simulate(args: &[String], i: &mut usize) -> Option<SimulateArgs> {
    if *i + 2 >= args.len() {
        log_warning!(
            "Missing arguments for --simulate. Usage: --simulate \"YYYY-MM-DD HH:MM:SS\" \"YYYY-MM-DD HH:MM:SS\" [multiplier | --fast-forward] [--log]"
        );
        return None;
    }

    let start_time = args[*i + 1].clone();
    let end_time = args[*i + 2].clone();
    *i += 2;

    for (label, value) in [("start", &start_time), ("end", &end_time)] {
        if source::parse_datetime(value).is_err() {
            log_error!("Invalid {label} time format: '{value}'. Use YYYY-MM-DD HH:MM:SS");
            return None;
        }
    }

    let mut multiplier = None;
    if let Some(next) = args.get(*i + 1) {
        if next == "--fast-forward" {
            multiplier = Some(0.0);
            *i += 1;
        } else if let Ok(value) = next.parse::<f64>() {
            if !(0.1..=3600.0).contains(&value) {
                log_error!("Invalid multiplier: {value}. Must be between 0.1 and 3600.");
                return None;
            }
            multiplier = Some(value);
            *i += 1;
        }
    }

    let mut log_to_file = false;
    if args.get(*i + 1).is_some_and(|next| next == "--log") {
        log_to_file = true;
        *i += 1;
    }

    Some(SimulateArgs {
        start_time,
        end_time,
        multiplier,
        log_to_file,
    })
}

fn parse_command(
    word: &str,
    rest: &[String],
    display_help: bool,
    debug_enabled: bool,
    json: bool,
    config_dir: Option<String>,
) -> CliAction {
    let Some(command) = canonical_command(word) else {
        log_warning!("Unknown command: {word}");
        return CliAction::ShowHelpDueToError;
    };

    if display_help && command != "help" {
        return CliAction::ShowCommandUsage { command };
    }

    // Arguments each command takes before anything left over is an error
    let arity = match command {
        "switch" | "auto" | "help" => 1,
        _ => 0,
    };

    if let Some(extra) = rest.get(arity) {
        if let Some(other) = canonical_command(extra) {
            log_warning!("Cannot use multiple commands at once: '{command}' and '{other}'");
        } else {
            log_warning!("Unexpected argument for {command}: '{extra}'");
        }
        return CliAction::ShowHelpDueToError;
    }

    match command {
        "toggle" => CliAction::Toggle {
            debug_enabled,
            config_dir,
        },
        "switch" => match rest.first().map(|word| word.parse::<Mode>()) {
            Some(Ok(mode)) => CliAction::Switch {
                debug_enabled,
                mode,
                config_dir,
            },
            Some(Err(e)) => {
                log_warning!("{e}");
                CliAction::ShowHelpDueToError
            }
            None => {
                log_warning!("Missing mode. Usage: nightswitch switch <day|night>");
                CliAction::ShowHelpDueToError
            }
        },
        "status" => CliAction::Status { json, config_dir },
        "reload" => CliAction::Reload {
            debug_enabled,
            config_dir,
        },
        "stop" => CliAction::Stop {
            debug_enabled,
            config_dir,
        },
        "auto" => match rest.first().map(|word| parse_switch_state(word)) {
            Some(Some(enabled)) => CliAction::Auto {
                enabled,
                config_dir,
            },
            Some(None) | None => {
                log_warning!("Usage: nightswitch auto <on|off>");
                CliAction::ShowHelpDueToError
            }
        },
        _ => CliAction::Help {
            command: rest.first().cloned(),
        },
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("nightswitch [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-j, --json             Machine-readable output for status");
    log_indented!("-S, --simulate         Run with simulated time (for testing schedules)");
    log_indented!("                       Usage: --simulate <start> <end> [multiplier] [--log]");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("toggle, t              Flip the running daemon to the other mode");
    log_indented!("switch, s <day|night>  Switch the running daemon to a mode");
    log_indented!("status, st             Show the last mode and the schedule");
    log_indented!("reload, r              Reload configuration in the running daemon");
    log_indented!("stop                   Stop the running daemon");
    log_indented!("auto, a <on|off>       Turn automatic switching on or off");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_end!();
}
