//! Appliers: the capability that actually changes the visible presentation.
//!
//! The scheduler decides *which* mode is active; an applier makes the desktop
//! look like it. Failures stay inside the applier's `Result` and the caller
//! only logs them, so a broken hook never stops the schedule.
//!
//! ## Implementations
//!
//! - **`CommandApplier`**: runs the configured `theme_command` and
//!   `background_command` hooks with the mode's identifiers substituted in.
//! - **`LogApplier`**: used when no hook is configured; records the change in the log.

use anyhow::Result;

use crate::config::Config;
use crate::core::mode::{Mode, ModeAssignment};

pub mod command;

pub use command::CommandApplier;

/// Something that can switch the presentation to a mode's assignment.
pub trait ModeApplier {
    /// Apply `assignment` for `mode`.
    ///
    /// Implementations may start asynchronous work and return before it
    /// finishes. Empty identifiers in `assignment` must be left alone.
    fn apply(&mut self, mode: Mode, assignment: &ModeAssignment) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;
}

/// Applier that only logs. Selected when no hooks are configured.
pub struct LogApplier;

impl ModeApplier for LogApplier {
    fn apply(&mut self, mode: Mode, assignment: &ModeAssignment) -> Result<()> {
        log_indented!(
            "{} theme: {}, background: {}",
            mode,
            assignment.theme_override().unwrap_or("(unchanged)"),
            assignment.background_override().unwrap_or("(unchanged)")
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Build the applier selected by the configuration.
pub fn create_applier(config: &Config, debug_enabled: bool) -> Box<dyn ModeApplier> {
    let theme_command = config.theme_command.clone().filter(|c| !c.trim().is_empty());
    let background_command = config
        .background_command
        .clone()
        .filter(|c| !c.trim().is_empty());

    if theme_command.is_none() && background_command.is_none() {
        if debug_enabled {
            log_pipe!();
            log_debug!("No hook commands configured, mode changes will only be logged");
        }
        return Box::new(LogApplier);
    }

    Box::new(CommandApplier::new(
        theme_command,
        background_command,
        debug_enabled,
    ))
}
