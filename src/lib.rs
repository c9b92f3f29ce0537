//! # nightswitch
//!
//! Library behind the nightswitch binary: a day/night scheduler that decides
//! which presentation mode should be active and hands the change to an
//! applier.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Nightswitch` builds the daemon and owns its resources
//! - **Core Logic**: `core` holds the schedule evaluator, the mode controller,
//!   the poll loop and the main loop that drives them
//! - **Appliers**: `applier` turns a mode change into hook commands
//! - **Configuration**: `config` for TOML settings with hot reload
//! - **State**: `state` persists the last mode and settings snapshot
//! - **Commands**: `commands` for CLI subcommands (toggle, switch, status, ...)
//! - **Infrastructure**: time sources, signals, instance locking and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

pub mod applier;
pub mod args;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod state;
pub mod time;

mod nightswitch;

pub use nightswitch::Nightswitch;
