//! Instance management for nightswitch processes.
//!
//! Coordinates the running daemon and the CLI commands that talk to it. The
//! lock file records who is running; signals carry the requests.

use anyhow::{Context, Result};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};

use crate::io::lock::{self, LockFile};
use crate::io::signals::{ModeRequest, mode_request_path};

/// Information about a running nightswitch instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub pid: u32,
    /// Custom config directory if set
    pub config_dir: Option<PathBuf>,
}

impl InstanceInfo {
    /// Information about this process.
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            config_dir: crate::config::get_custom_config_dir(),
        }
    }

    /// Parse lock file contents: the PID, then an optional config directory line.
    pub fn from_lock_contents(contents: &str) -> Result<Self> {
        let lines: Vec<&str> = contents.trim_end().lines().collect();

        if lines.is_empty() || lines.len() > 2 {
            anyhow::bail!("Invalid lock file format (expected 1-2 lines)");
        }

        let pid = lines[0]
            .trim()
            .parse::<u32>()
            .context("Invalid PID format in lock file")?;

        let config_dir = lines
            .get(1)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(PathBuf::from);

        Ok(InstanceInfo { pid, config_dir })
    }

    pub fn to_lock_contents(&self) -> String {
        match &self.config_dir {
            Some(dir) => format!("{}\n{}\n", self.pid, dir.display()),
            None => format!("{}\n\n", self.pid),
        }
    }
}

/// Get information about the currently running nightswitch instance.
///
/// Also adopts the instance's config directory for this process, so commands
/// like `status` read the same configuration the daemon uses.
pub fn get_running_instance() -> Result<Option<InstanceInfo>> {
    let lock_path = lock::get_main_lock_path();

    let lock_content = match std::fs::read_to_string(&lock_path) {
        Ok(content) => content,
        Err(_) => return Ok(None),
    };

    let info = InstanceInfo::from_lock_contents(&lock_content)?;

    if let Some(ref config_dir) = info.config_dir {
        let _ = crate::config::set_config_dir(Some(config_dir.display().to_string()));
    }

    if is_instance_running(info.pid) {
        Ok(Some(info))
    } else {
        Ok(None)
    }
}

/// Get just the PID of the running nightswitch instance.
pub fn get_running_instance_pid() -> Result<u32> {
    get_running_instance()?
        .map(|info| info.pid)
        .ok_or_else(|| anyhow::anyhow!("No nightswitch instance running"))
}

/// Check if a process with the given PID is still running.
pub fn is_instance_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    kill(Pid::from_raw(pid as i32), signal)
        .with_context(|| format!("Failed to send {signal} to process {pid}"))
}

/// Terminate an instance by sending SIGTERM.
pub fn terminate_instance(pid: u32) -> Result<()> {
    send_signal(pid, Signal::SIGTERM)
}

/// Ask an instance to reload its configuration (SIGUSR2).
pub fn send_reload_signal(pid: u32) -> Result<()> {
    send_signal(pid, Signal::SIGUSR2)
}

/// Ask an instance to change mode (SIGUSR1).
///
/// The request is written to a per-PID file that the instance reads when the
/// signal arrives.
pub fn send_mode_request(pid: u32, request: ModeRequest) -> Result<()> {
    let path = mode_request_path(pid);
    std::fs::write(&path, request.as_str())
        .with_context(|| format!("Failed to write mode request to {}", path.display()))?;
    send_signal(pid, Signal::SIGUSR1)
}

/// Take the daemon lock, clearing it first if its owner is gone.
pub fn ensure_single_instance() -> Result<LockFile> {
    let lock_path = lock::get_main_lock_path();

    if let Some(mut lock) = LockFile::try_acquire(&lock_path)? {
        lock.write(&InstanceInfo::current().to_lock_contents())?;
        return Ok(lock);
    }

    handle_instance_conflict(&lock_path)?;

    match LockFile::try_acquire(&lock_path)? {
        Some(mut lock) => {
            lock.write(&InstanceInfo::current().to_lock_contents())?;
            Ok(lock)
        }
        None => anyhow::bail!("Failed to acquire lock after conflict resolution"),
    }
}

/// Resolve a held lock: stale or malformed locks are removed, a live owner is an error.
pub fn handle_instance_conflict(lock_path: &Path) -> Result<()> {
    let lock_content = match std::fs::read_to_string(lock_path) {
        Ok(content) => content,
        Err(_) => return Ok(()),
    };

    let info = match InstanceInfo::from_lock_contents(&lock_content) {
        Ok(info) => info,
        Err(_) => {
            log_warning!("Lock file format invalid, removing");
            let _ = std::fs::remove_file(lock_path);
            return Ok(());
        }
    };

    if !is_instance_running(info.pid) {
        log_warning!(
            "Removing stale lock file (process {} no longer running)",
            info.pid
        );
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    }

    log_pipe!();
    log_error!("nightswitch is already running (PID: {})", info.pid);
    log_block_start!("Did you mean to:");
    log_indented!("• Toggle the mode: nightswitch toggle");
    log_indented!("• Switch explicitly: nightswitch switch <day|night>");
    log_indented!("• Reload configuration: nightswitch reload");
    anyhow::bail!("Another nightswitch instance is running")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_info_from_lock_contents() {
        let info = InstanceInfo::from_lock_contents("12345\n/home/user/.config/ns\n").unwrap();
        assert_eq!(info.pid, 12345);
        assert_eq!(info.config_dir, Some(PathBuf::from("/home/user/.config/ns")));

        let info = InstanceInfo::from_lock_contents("67890\n\n").unwrap();
        assert_eq!(info.config_dir, None);

        let info = InstanceInfo::from_lock_contents("11111").unwrap();
        assert_eq!(info.pid, 11111);
    }

    #[test]
    fn test_instance_info_from_lock_contents_errors() {
        assert!(InstanceInfo::from_lock_contents("").is_err());
        assert!(InstanceInfo::from_lock_contents("not_a_pid\n").is_err());
        assert!(InstanceInfo::from_lock_contents("1\n/a\nextra").is_err());
    }

    #[test]
    fn test_instance_info_to_lock_contents_is_parseable() {
        let info = InstanceInfo {
            pid: 99999,
            config_dir: Some(PathBuf::from("/custom/config")),
        };
        let contents = info.to_lock_contents();
        assert_eq!(contents, "99999\n/custom/config\n");
        assert_eq!(InstanceInfo::from_lock_contents(&contents).unwrap(), info);
    }

    #[test]
    fn test_is_instance_running() {
        assert!(is_instance_running(std::process::id()));
        assert!(!is_instance_running(999_999_999));
    }

    #[test]
    fn test_stale_lock_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("stale.lock");
        std::fs::write(&lock_path, "999999999\n\n").unwrap();

        handle_instance_conflict(&lock_path).unwrap();
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_live_lock_is_a_conflict() {
        crate::common::logger::Log::set_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("live.lock");
        std::fs::write(&lock_path, format!("{}\n\n", std::process::id())).unwrap();

        assert!(handle_instance_conflict(&lock_path).is_err());
        assert!(lock_path.exists());
    }
}
