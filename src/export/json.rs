//! JSON Export functionality
//!
//! Exports audit records to JSON with schema versioning and summary metadata.

use std::collections::BTreeSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};
use crate::models::AuditRecord;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Audit log export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Export metadata
    pub metadata: ExportMetadata,

    /// Exported records, oldest first
    pub records: Vec<AuditRecord>,
}

/// Summary of the exported records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Total number of records
    pub record_count: usize,

    /// Number of distinct save operations
    pub batch_count: usize,

    /// Distinct audited types
    pub object_types: Vec<String>,

    /// Timestamp of the oldest record
    pub earliest: Option<DateTime<Utc>>,

    /// Timestamp of the newest record
    pub latest: Option<DateTime<Utc>>,
}

impl ExportMetadata {
    fn from_records(records: &[AuditRecord]) -> Self {
        let batches: BTreeSet<_> = records.iter().map(|r| r.batch_id.to_string()).collect();
        let object_types: BTreeSet<_> = records.iter().map(|r| r.object_type.clone()).collect();

        Self {
            record_count: records.len(),
            batch_count: batches.len(),
            object_types: object_types.into_iter().collect(),
            earliest: records.iter().map(|r| r.utc_date).min(),
            latest: records.iter().map(|r| r.utc_date).max(),
        }
    }
}

impl AuditExport {
    /// Wrap records in an export envelope
    pub fn new(records: Vec<AuditRecord>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            metadata: ExportMetadata::from_records(&records),
            records,
        }
    }
}

/// Export audit records to JSON
pub fn export_audit_json<W: Write>(
    records: Vec<AuditRecord>,
    writer: &mut W,
    pretty: bool,
) -> AuditResult<()> {
    let export = AuditExport::new(records);

    let result = if pretty {
        serde_json::to_writer_pretty(&mut *writer, &export)
    } else {
        serde_json::to_writer(&mut *writer, &export)
    };
    result.map_err(|e| AuditError::Export(e.to_string()))?;

    writeln!(writer).map_err(|e| AuditError::Export(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_records;

    #[test]
    fn test_metadata_summarizes_records() {
        let export = AuditExport::new(sample_records());

        assert_eq!(export.schema_version, EXPORT_SCHEMA_VERSION);
        assert_eq!(export.metadata.record_count, 3);
        assert_eq!(export.metadata.batch_count, 2);
        assert_eq!(export.metadata.object_types, vec!["Customer", "Order"]);
        assert!(export.metadata.earliest <= export.metadata.latest);
    }

    #[test]
    fn test_json_export_parses_back() {
        let mut output = Vec::new();
        export_audit_json(sample_records(), &mut output, true).unwrap();

        let parsed: AuditExport = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.records[0].property, "Status");

        let raw = String::from_utf8(output).unwrap();
        assert!(raw.contains("\"batchId\""));
        assert!(raw.contains("\"keyValues\""));
    }

    #[test]
    fn test_empty_export() {
        let export = AuditExport::new(Vec::new());
        assert_eq!(export.metadata.record_count, 0);
        assert!(export.metadata.earliest.is_none());
    }
}
