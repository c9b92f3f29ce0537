//! File watching for hot config reloading.
//!
//! The config directory is watched rather than the file itself, since most
//! editors save by writing a new file and renaming it over the old one.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use super::get_config_path;
use crate::common::constants::CONFIG_RELOAD_DEBOUNCE;
use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Watches `nightswitch.toml` and sends [`SignalMessage::ConfigChanged`].
pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    config_path: PathBuf,
    debug_enabled: bool,
}

impl ConfigWatcher {
    pub fn new(
        signal_sender: Sender<SignalMessage>,
        config_path: PathBuf,
        debug_enabled: bool,
    ) -> Self {
        Self {
            signal_sender,
            config_path,
            debug_enabled,
        }
    }

    /// Spawn the watcher thread. It lives until the main loop drops its receiver.
    pub fn start(self) -> Result<()> {
        let Some(config_dir) = self.config_path.parent().map(Path::to_path_buf) else {
            anyhow::bail!("Config path has no parent directory");
        };

        if !config_dir.is_dir() {
            if self.debug_enabled {
                log_pipe!();
                log_debug!("Config directory missing, hot reload disabled");
            }
            return Ok(());
        }

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Watching {} for changes", private_path(&self.config_path));
        }

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&config_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(&config_dir)))?;

        let ConfigWatcher {
            signal_sender,
            config_path,
            debug_enabled,
        } = self;

        thread::spawn(move || {
            // Dropping the watcher stops event delivery
            let _watcher = watcher;
            let mut last_reload: Option<Instant> = None;

            for event in rx {
                if !event.paths.iter().any(|p| is_config_event(p, &config_path)) {
                    continue;
                }

                if last_reload.is_some_and(|t| t.elapsed() < CONFIG_RELOAD_DEBOUNCE) {
                    continue;
                }

                if debug_enabled {
                    log_pipe!();
                    log_debug!("Configuration file change detected");
                }

                if signal_sender.send(SignalMessage::ConfigChanged).is_err() {
                    break;
                }
                last_reload = Some(Instant::now());
            }
        });

        Ok(())
    }
}

/// Whether an event on `event_path` concerns the config file.
///
/// Editor temporaries such as `nightswitch.toml~` or `.nightswitch.toml.swp`
/// count, since the rename that follows them is what replaces the file.
pub fn is_config_event(event_path: &Path, config_path: &Path) -> bool {
    if event_path == config_path {
        return true;
    }

    let Some(config_name) = config_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let same_dir = event_path.parent() == config_path.parent();
    let event_name = event_path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    same_dir && event_name.trim_start_matches('.').starts_with(config_name)
}

/// Start the configuration file watcher for the active config path.
pub fn start_config_watcher(
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    let config_path = get_config_path()?;
    ConfigWatcher::new(signal_sender, config_path, debug_enabled).start()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_config_event_matches_file_and_temporaries() {
        let config = Path::new("/home/u/.config/nightswitch/nightswitch.toml");
        assert!(is_config_event(config, config));
        assert!(is_config_event(
            Path::new("/home/u/.config/nightswitch/nightswitch.toml~"),
            config
        ));
        assert!(is_config_event(
            Path::new("/home/u/.config/nightswitch/.nightswitch.toml.swp"),
            config
        ));
    }

    #[test]
    fn test_is_config_event_ignores_other_files() {
        let config = Path::new("/home/u/.config/nightswitch/nightswitch.toml");
        assert!(!is_config_event(
            Path::new("/home/u/.config/nightswitch/notes.txt"),
            config
        ));
        assert!(!is_config_event(
            Path::new("/home/u/.config/other/nightswitch.toml"),
            config
        ));
    }
}
