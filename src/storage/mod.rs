//! Storage layer for entity-auditor
//!
//! Provides the JSON entity store, the append-only audit log, and the
//! change-tracking [`Session`] that commits against both.

pub mod audit_log;
pub mod entities;
pub mod file_io;
pub mod session;

pub use audit_log::AuditLogStore;
pub use entities::EntityStore;
pub use file_io::{read_json, write_json_atomic};
pub use session::Session;

use crate::config::paths::AuditorPaths;
use crate::error::AuditError;

/// Main storage coordinator that provides access to both stores
pub struct Storage {
    paths: AuditorPaths,
    pub entities: EntityStore,
    pub audit_log: AuditLogStore,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: AuditorPaths) -> Result<Self, AuditError> {
        paths.ensure_directories()?;

        Ok(Self {
            entities: EntityStore::new(paths.entities_file()),
            audit_log: AuditLogStore::new(paths.audit_log()),
            paths,
        })
    }

    /// Create storage and load committed entities from disk
    pub fn open(paths: AuditorPaths) -> Result<Self, AuditError> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &AuditorPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), AuditError> {
        self.entities.load()
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), AuditError> {
        self.entities.save()
    }

    /// Check if storage has been initialized (has a settings file)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValues;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditorPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
        assert!(!storage.audit_log.exists());
    }

    #[test]
    fn test_open_loads_saved_entities() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditorPaths::with_base_dir(temp_dir.path().to_path_buf());

        let storage = Storage::new(paths.clone()).unwrap();
        storage
            .entities
            .upsert("Order", "1", FieldValues::new().with("OrderId", 1i64))
            .unwrap();
        storage.save_all().unwrap();

        let reopened = Storage::open(paths).unwrap();
        assert_eq!(reopened.entities.count("Order").unwrap(), 1);
    }
}
