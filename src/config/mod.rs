//! Configuration module for entity-auditor
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Audit settings persistence

pub mod paths;
pub mod settings;

pub use paths::AuditorPaths;
pub use settings::AuditSettings;
