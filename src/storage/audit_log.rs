//! Append-only audit log store
//!
//! Each committed [`AuditRecord`] is written as a single JSON line (JSONL).
//! Records are assigned ids on append, continuing from the highest id
//! already in the file.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecord, BatchId};

/// Reads and appends audit records in the audit log file
pub struct AuditLogStore {
    log_path: PathBuf,
}

impl AuditLogStore {
    /// Create a store over the log at `log_path`
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append records as one batch, assigning their ids
    ///
    /// All lines are written before a single flush and sync.
    pub fn append_batch(&self, records: &mut [AuditRecord]) -> AuditResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut next_id = self.last_id()? + 1;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| AuditError::Io(format!("Failed to open audit log: {}", e)))?;

        for record in records.iter_mut() {
            record.id = next_id;
            next_id += 1;

            let json = serde_json::to_string(record)
                .map_err(|e| AuditError::Json(format!("Failed to serialize audit record: {}", e)))?;

            writeln!(file, "{}", json)
                .map_err(|e| AuditError::Io(format!("Failed to write audit record: {}", e)))?;
        }

        file.flush()
            .map_err(|e| AuditError::Io(format!("Failed to flush audit log: {}", e)))?;
        file.sync_all()
            .map_err(|e| AuditError::Io(format!("Failed to sync audit log: {}", e)))?;

        tracing::debug!(records = records.len(), path = %self.log_path.display(), "appended audit records");
        Ok(())
    }

    /// Read all records, oldest first
    pub fn read_all(&self) -> AuditResult<Vec<AuditRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| AuditError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                AuditError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let record: AuditRecord = serde_json::from_str(&line).map_err(|e| {
                AuditError::Json(format!(
                    "Failed to parse audit record at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            records.push(record);
        }

        Ok(records)
    }

    /// Read the most recent N records
    pub fn read_recent(&self, count: usize) -> AuditResult<Vec<AuditRecord>> {
        let mut records = self.read_all()?;
        let start = records.len().saturating_sub(count);
        Ok(records.split_off(start))
    }

    /// Read every record of one save operation
    pub fn read_batch(&self, batch_id: BatchId) -> AuditResult<Vec<AuditRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.batch_id == batch_id)
            .collect())
    }

    /// Number of records in the log
    pub fn entry_count(&self) -> AuditResult<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.log_path)
            .map_err(|e| AuditError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut count = 0;
        for line in reader.lines() {
            let line = line.map_err(|e| AuditError::Io(format!("Failed to read audit log: {}", e)))?;
            if !line.trim().is_empty() {
                count += 1;
            }
        }

        Ok(count)
    }

    /// Check if the audit log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Get the path to the audit log file
    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }

    fn last_id(&self) -> AuditResult<u64> {
        Ok(self.read_all()?.iter().map(|r| r.id).max().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_store() -> (AuditLogStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditLogStore::new(temp_dir.path().join("audit.log"));
        (store, temp_dir)
    }

    fn create_test_record(batch_id: BatchId, property: &str) -> AuditRecord {
        AuditRecord {
            id: 0,
            batch_id,
            object_type: "Order".to_string(),
            key_members: "OrderId".to_string(),
            key_values: "1".to_string(),
            action: "Added".to_string(),
            property: property.to_string(),
            old_value: None,
            new_value: Some("\"Open\"".to_string()),
            username: "alice".to_string(),
            utc_date: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_read() {
        let (store, _temp) = create_test_store();
        let mut records = vec![create_test_record(BatchId::new(), "Status")];

        store.append_batch(&mut records).unwrap();

        let read = store.read_all().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0], records[0]);
        assert_eq!(read[0].id, 1);
    }

    #[test]
    fn test_ids_continue_across_batches() {
        let (store, _temp) = create_test_store();

        let mut first: Vec<_> = (0..3)
            .map(|i| create_test_record(BatchId::new(), &format!("Field{}", i)))
            .collect();
        store.append_batch(&mut first).unwrap();

        let mut second = vec![create_test_record(BatchId::new(), "Status")];
        store.append_batch(&mut second).unwrap();

        let ids: Vec<u64> = store.read_all().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(store.entry_count().unwrap(), 4);
    }

    #[test]
    fn test_read_recent() {
        let (store, _temp) = create_test_store();
        let mut records: Vec<_> = (0..10)
            .map(|i| create_test_record(BatchId::new(), &format!("Field{}", i)))
            .collect();
        store.append_batch(&mut records).unwrap();

        let recent = store.read_recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].property, "Field7");
        assert_eq!(recent[2].property, "Field9");
    }

    #[test]
    fn test_read_batch() {
        let (store, _temp) = create_test_store();
        let batch = BatchId::new();
        let mut records = vec![
            create_test_record(batch, "Status"),
            create_test_record(BatchId::new(), "Status"),
            create_test_record(batch, "Total"),
        ];
        store.append_batch(&mut records).unwrap();

        let read = store.read_batch(batch).unwrap();
        assert_eq!(read.len(), 2);
        assert!(read.iter().all(|r| r.batch_id == batch));
    }

    #[test]
    fn test_empty_log() {
        let (store, _temp) = create_test_store();

        assert!(!store.exists());
        assert_eq!(store.entry_count().unwrap(), 0);
        assert!(store.read_all().unwrap().is_empty());

        store.append_batch(&mut []).unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn test_survives_reopen() {
        let (store, temp) = create_test_store();
        store
            .append_batch(&mut [create_test_record(BatchId::new(), "Status")])
            .unwrap();

        let reopened = AuditLogStore::new(temp.path().join("audit.log"));
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_unwritable_log_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("audit.log");
        std::fs::create_dir(&path).unwrap();

        let store = AuditLogStore::new(path);
        let result = store.append_batch(&mut [create_test_record(BatchId::new(), "Status")]);
        assert!(result.is_err());
    }
}
