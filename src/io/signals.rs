//! Signal handling for the daemon.
//!
//! A dedicated thread turns Unix signals into [`SignalMessage`]s on a channel
//! that the main loop drains between ticks:
//!
//! - `SIGUSR1`: mode request, read from `/tmp/nightswitch-request-<pid>.tmp`
//! - `SIGUSR2`: reload configuration
//! - `SIGINT`, `SIGTERM`, `SIGHUP`: shut down

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::common::constants::APP_NAME;
use crate::core::mode::Mode;

/// A mode change asked for from outside the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Toggle,
    Set(Mode),
}

impl ModeRequest {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeRequest::Toggle => "toggle",
            ModeRequest::Set(mode) => mode.as_str(),
        }
    }
}

impl FromStr for ModeRequest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "toggle" => Ok(ModeRequest::Toggle),
            other => other
                .parse::<Mode>()
                .map(ModeRequest::Set)
                .with_context(|| format!("Unknown mode request '{other}'")),
        }
    }
}

/// Messages delivered to the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    /// Explicit reload request (SIGUSR2)
    Reload,
    /// The config file changed on disk
    ConfigChanged,
    /// Toggle or switch the mode (SIGUSR1)
    ModeRequest(ModeRequest),
    /// SIGINT, SIGTERM or SIGHUP
    Shutdown,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared when a shutdown signal arrives
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Cloned by other producers such as the config watcher
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// A state with no signal thread attached, fed only through `signal_sender`.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = std::sync::mpsc::channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// File a CLI writes its request to before sending SIGUSR1 to `pid`.
pub fn mode_request_path(pid: u32) -> PathBuf {
    PathBuf::from(format!("/tmp/{APP_NAME}-request-{pid}.tmp"))
}

/// Read and remove the pending mode request for this process.
fn take_mode_request() -> Option<ModeRequest> {
    let path = mode_request_path(std::process::id());
    let content = std::fs::read_to_string(&path).ok()?;
    let _ = std::fs::remove_file(&path);

    match content.parse() {
        Ok(request) => Some(request),
        Err(e) => {
            log_pipe!();
            log_warning!("Ignoring mode request: {e}");
            None
        }
    }
}

/// Install signal handlers and spawn the thread that forwards them.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = Arc::clone(&state.running);
    let sender = state.signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            let message = match sig {
                SIGUSR1 => match take_mode_request() {
                    Some(request) => {
                        log_pipe!();
                        log_info!("Received mode request: {}", request.as_str());
                        SignalMessage::ModeRequest(request)
                    }
                    None => continue,
                },
                SIGUSR2 => {
                    log_pipe!();
                    log_info!("Received configuration reload signal");
                    SignalMessage::Reload
                }
                _ => {
                    log_pipe!();
                    match sig {
                        SIGINT if debug_enabled => {
                            log_info!("Received SIGINT (Ctrl+C), shutting down...")
                        }
                        SIGINT => log_info!("Received interrupt signal, shutting down..."),
                        SIGHUP => log_info!("Terminal disconnected, shutting down..."),
                        _ => log_info!("Received termination request, shutting down..."),
                    }
                    running.store(false, Ordering::SeqCst);
                    SignalMessage::Shutdown
                }
            };

            let is_shutdown = message == SignalMessage::Shutdown;
            if sender.send(message).is_err() || is_shutdown {
                break;
            }
        }
    });

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_request_parsing() {
        assert_eq!("toggle".parse::<ModeRequest>().unwrap(), ModeRequest::Toggle);
        assert_eq!(
            "night\n".parse::<ModeRequest>().unwrap(),
            ModeRequest::Set(Mode::Night)
        );
        assert_eq!(
            "day".parse::<ModeRequest>().unwrap(),
            ModeRequest::Set(Mode::Day)
        );
        assert!("dusk".parse::<ModeRequest>().is_err());
    }

    #[test]
    fn test_mode_request_file_format_round_trips() {
        for request in [
            ModeRequest::Toggle,
            ModeRequest::Set(Mode::Day),
            ModeRequest::Set(Mode::Night),
        ] {
            assert_eq!(request.as_str().parse::<ModeRequest>().unwrap(), request);
        }
    }

    #[test]
    fn test_mode_request_path_is_per_pid() {
        assert_eq!(
            mode_request_path(42),
            PathBuf::from("/tmp/nightswitch-request-42.tmp")
        );
    }

    #[test]
    fn test_detached_state_delivers_messages() {
        let state = SignalState::detached();
        state.signal_sender.send(SignalMessage::Reload).unwrap();
        assert_eq!(state.signal_receiver.recv().unwrap(), SignalMessage::Reload);
        assert!(state.is_running());
    }
}
