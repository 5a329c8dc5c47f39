//! YAML Export functionality
//!
//! Same envelope as the JSON export, for human review.

use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::export::json::AuditExport;
use crate::models::AuditRecord;

/// Export audit records to YAML
pub fn export_audit_yaml<W: Write>(records: Vec<AuditRecord>, writer: &mut W) -> AuditResult<()> {
    let export = AuditExport::new(records);

    writeln!(writer, "# entity-auditor audit log export")
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer, "# Generated: {}", export.exported_at)
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer, "# App Version: {}", export.app_version)
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| AuditError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_records;

    #[test]
    fn test_yaml_export() {
        let mut output = Vec::new();
        export_audit_yaml(sample_records(), &mut output).unwrap();

        let yaml = String::from_utf8(output).unwrap();
        assert!(yaml.starts_with("# entity-auditor audit log export"));
        assert!(yaml.contains("schema_version"));
        assert!(yaml.contains("objectType: Order"));

        let parsed: AuditExport = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.metadata.batch_count, 2);
    }
}
