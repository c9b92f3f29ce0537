//! Persistent runtime state, following XDG Base Directory conventions.
//!
//! Configuration lives in `XDG_CONFIG_HOME`; everything the daemon records about
//! itself (the last active mode and a snapshot of the settings that produced
//! it) lives under `XDG_STATE_HOME/nightswitch/{namespace}` so that several
//! configuration directories never share state.

pub mod store;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::common::constants::{APP_NAME, STATE_FILE_NAME};
use crate::config::get_custom_config_dir;

pub use store::{FileStore, MemoryStore, SettingsStore};

/// Get the state directory for a given configuration directory.
///
/// The namespace is `default` for the default config directory and
/// `custom_<hash>` for directories passed with `--config`.
pub fn get_state_dir(config_dir: Option<&Path>) -> Result<PathBuf> {
    let state_home = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local/state")
        });

    let namespace = match config_dir {
        None => "default".to_string(),
        Some(path) => {
            let default_config = dirs::config_dir()
                .context("Could not determine config directory")?
                .join(APP_NAME);
            if path == default_config {
                "default".to_string()
            } else {
                get_state_namespace(path)
            }
        }
    };

    Ok(state_home.join(APP_NAME).join(namespace))
}

/// Stable namespace for a custom config directory.
fn get_state_namespace(config_path: &Path) -> String {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());

    let hash = sha256::digest(canonical.to_string_lossy().as_bytes());
    format!("custom_{}", &hash[..16])
}

/// Path of the state file for the active configuration directory.
pub fn get_state_file_path() -> Result<PathBuf> {
    let config_dir = get_custom_config_dir();
    Ok(get_state_dir(config_dir.as_deref())?.join(STATE_FILE_NAME))
}

/// Open the state store for the active configuration directory.
pub fn open_default_store() -> Result<FileStore> {
    FileStore::open(get_state_file_path()?)
}
