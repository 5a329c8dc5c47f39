//! Entity store for JSON storage
//!
//! Committed entity rows, grouped by type and keyed by their rendered key,
//! plus the last identity handed out per type. Backed by `data/entities.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::models::FieldValues;

use super::file_io::{read_json, write_json_atomic};

/// Serializable entity data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EntityData {
    #[serde(default)]
    tables: BTreeMap<String, BTreeMap<String, FieldValues>>,

    #[serde(default)]
    identities: BTreeMap<String, i64>,
}

/// Repository for committed entity rows
pub struct EntityStore {
    path: PathBuf,
    data: RwLock<EntityData>,
}

impl EntityStore {
    /// Create a new entity store
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(EntityData::default()),
        }
    }

    /// Load rows from disk
    pub fn load(&self) -> Result<(), AuditError> {
        let file_data: EntityData = read_json(&self.path)?;
        *self.write()? = file_data;
        Ok(())
    }

    /// Save rows to disk
    pub fn save(&self) -> Result<(), AuditError> {
        let data = self.read()?;
        write_json_atomic(&self.path, &*data)?;
        tracing::debug!(path = %self.path.display(), "saved entity store");
        Ok(())
    }

    /// Insert or replace a row
    pub fn upsert(&self, type_name: &str, key: &str, values: FieldValues) -> Result<(), AuditError> {
        self.write()?
            .tables
            .entry(type_name.to_string())
            .or_default()
            .insert(key.to_string(), values);
        Ok(())
    }

    /// Delete a row, returning whether it existed
    pub fn remove(&self, type_name: &str, key: &str) -> Result<bool, AuditError> {
        let mut data = self.write()?;
        Ok(data
            .tables
            .get_mut(type_name)
            .is_some_and(|table| table.remove(key).is_some()))
    }

    /// Get one row
    pub fn get(&self, type_name: &str, key: &str) -> Result<Option<FieldValues>, AuditError> {
        Ok(self
            .read()?
            .tables
            .get(type_name)
            .and_then(|table| table.get(key))
            .cloned())
    }

    /// All rows of a type, ordered by key
    pub fn rows(&self, type_name: &str) -> Result<Vec<(String, FieldValues)>, AuditError> {
        Ok(self
            .read()?
            .tables
            .get(type_name)
            .map(|table| {
                table
                    .iter()
                    .map(|(key, values)| (key.clone(), values.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Number of rows of a type
    pub fn count(&self, type_name: &str) -> Result<usize, AuditError> {
        Ok(self
            .read()?
            .tables
            .get(type_name)
            .map_or(0, |table| table.len()))
    }

    /// Names of all types with at least one row
    pub fn type_names(&self) -> Result<Vec<String>, AuditError> {
        Ok(self
            .read()?
            .tables
            .iter()
            .filter(|(_, table)| !table.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Hand out the next identity for a type, starting at 1
    pub fn next_identity(&self, type_name: &str) -> Result<i64, AuditError> {
        let mut data = self.write()?;
        let last = data.identities.entry(type_name.to_string()).or_insert(0);
        *last += 1;
        Ok(*last)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EntityData>, AuditError> {
        self.data
            .read()
            .map_err(|e| AuditError::Persistence(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, EntityData>, AuditError> {
        self.data
            .write()
            .map_err(|e| AuditError::Persistence(format!("Failed to acquire write lock: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (EntityStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = EntityStore::new(temp_dir.path().join("entities.json"));
        (store, temp_dir)
    }

    fn row(status: &str) -> FieldValues {
        FieldValues::new().with("OrderId", 1i64).with("Status", status)
    }

    #[test]
    fn test_upsert_and_get() {
        let (store, _temp) = create_test_store();
        store.upsert("Order", "1", row("Open")).unwrap();
        store.upsert("Order", "1", row("Closed")).unwrap();

        let values = store.get("Order", "1").unwrap().unwrap();
        assert_eq!(values.get("Status"), Some(&"Closed".into()));
        assert_eq!(store.count("Order").unwrap(), 1);
    }

    #[test]
    fn test_remove() {
        let (store, _temp) = create_test_store();
        store.upsert("Order", "1", row("Open")).unwrap();

        assert!(store.remove("Order", "1").unwrap());
        assert!(!store.remove("Order", "1").unwrap());
        assert!(!store.remove("Customer", "1").unwrap());
        assert_eq!(store.count("Order").unwrap(), 0);
        assert!(store.type_names().unwrap().is_empty());
    }

    #[test]
    fn test_identities_are_per_type() {
        let (store, _temp) = create_test_store();
        assert_eq!(store.next_identity("Order").unwrap(), 1);
        assert_eq!(store.next_identity("Order").unwrap(), 2);
        assert_eq!(store.next_identity("Customer").unwrap(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("entities.json");

        let store = EntityStore::new(path.clone());
        store.upsert("Order", "1", row("Open")).unwrap();
        store.next_identity("Order").unwrap();
        store.save().unwrap();

        let reloaded = EntityStore::new(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.rows("Order").unwrap().len(), 1);
        assert_eq!(reloaded.next_identity("Order").unwrap(), 2);
    }
}
