//! Audit settings for entity-auditor
//!
//! Holds the two behavior gates of the recorder (`use_audit_logging`,
//! `ignore_audit_log_exceptions`), the actor used when a session is opened
//! without one, and configured opt-outs.

use serde::{Deserialize, Serialize};

use super::paths::AuditorPaths;
use crate::error::AuditError;

/// Actor recorded when none is supplied
pub const DEFAULT_USERNAME: &str = "Unknown user";

/// Settings consumed by the batch recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// When false, saves commit without writing any audit records
    #[serde(default = "default_true")]
    pub use_audit_logging: bool,

    /// When true, failures while auditing are logged and swallowed
    #[serde(default)]
    pub ignore_audit_log_exceptions: bool,

    /// Actor used by sessions opened without a username
    #[serde(default = "default_username")]
    pub default_username: String,

    /// Entity types never audited
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_types: Vec<String>,

    /// Fields never audited, written as `Type.Field`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_properties: Vec<String>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            use_audit_logging: true,
            ignore_audit_log_exceptions: false,
            default_username: default_username(),
            ignored_types: Vec::new(),
            ignored_properties: Vec::new(),
        }
    }
}

impl AuditSettings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &AuditorPaths) -> Result<Self, AuditError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                AuditError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: AuditSettings = serde_json::from_str(&contents).map_err(|e| {
                AuditError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(AuditSettings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditorPaths) -> Result<(), AuditError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AuditError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            AuditError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}
