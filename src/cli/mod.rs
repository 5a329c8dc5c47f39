//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the storage layer.

pub mod export;
pub mod log;

pub use export::{handle_export_command, ExportArgs};
pub use log::{handle_log_command, LogCommands};
