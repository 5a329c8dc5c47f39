//! Export module for entity-auditor
//!
//! Writes audit records in formats consumed by compliance tooling:
//! - CSV: one row per record (spreadsheet-compatible)
//! - JSON: records plus export metadata
//! - YAML: same envelope as JSON, human-readable

pub mod csv;
pub mod json;
pub mod yaml;

use std::fmt;
use std::io::Write;

pub use self::csv::export_audit_csv;
pub use json::{export_audit_json, AuditExport, ExportMetadata, EXPORT_SCHEMA_VERSION};
pub use yaml::export_audit_yaml;

use crate::error::AuditResult;
use crate::models::AuditRecord;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// One row per record
    Csv,
    /// Records with metadata
    Json,
    /// Records with metadata, human-readable
    Yaml,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Export records in the given format
pub fn export_records<W: Write>(
    format: ExportFormat,
    records: Vec<AuditRecord>,
    writer: &mut W,
) -> AuditResult<()> {
    match format {
        ExportFormat::Csv => export_audit_csv(&records, writer),
        ExportFormat::Json => export_audit_json(records, writer, true),
        ExportFormat::Yaml => export_audit_yaml(records, writer),
    }
}
