//! Key/value persistence for scheduler settings and the last active mode.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::utils::private_path;

/// Durable key/value storage scoped to one configuration directory.
pub trait SettingsStore {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn persist(&mut self, key: &str, value: Value) -> Result<()>;
}

/// Store backed by a single JSON object on disk.
///
/// Every `persist` rewrites the file through a temporary sibling and a rename,
/// so readers never observe a partially written file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// A corrupt file is also treated as empty (with a warning) and is
    /// replaced on the next write.
    pub fn open(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state from {}", private_path(&path)))?;
            match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    log_warning!(
                        "Ignoring unreadable state file {}",
                        private_path(&path)
                    );
                    Map::new()
                }
            }
        } else {
            Map::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory {}", private_path(parent))
            })?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(self.entries.clone()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write state to {}", private_path(&tmp_path)))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", private_path(&self.path)))?;
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn persist(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }
}

/// Store that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn persist(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
