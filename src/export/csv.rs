//! CSV Export functionality
//!
//! One row per audit record, with the record's serialized column names as
//! the header.

use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::models::AuditRecord;

/// Export audit records to CSV
pub fn export_audit_csv<W: Write>(records: &[AuditRecord], writer: &mut W) -> AuditResult<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);

    for record in records {
        csv_writer
            .serialize(record)
            .map_err(|e| AuditError::Export(e.to_string()))?;
    }

    csv_writer
        .flush()
        .map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_records;

    #[test]
    fn test_csv_header_and_rows() {
        let mut output = Vec::new();
        export_audit_csv(&sample_records(), &mut output).unwrap();

        let csv = String::from_utf8(output).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,batchId,objectType,keyMembers,keyValues,action,property,oldValue,newValue,username,utcDate"
        );
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn test_csv_quotes_embedded_values() {
        let mut output = Vec::new();
        export_audit_csv(&sample_records(), &mut output).unwrap();

        let mut reader = ::csv::Reader::from_reader(output.as_slice());
        let first = reader.records().next().unwrap().unwrap();
        // Formatted values keep their own quotes through CSV escaping
        assert_eq!(&first[7], "\"Open\"");
        assert_eq!(&first[8], "\"Closed\"");
    }

    #[test]
    fn test_csv_empty_export() {
        let mut output = Vec::new();
        export_audit_csv(&[], &mut output).unwrap();
        assert!(output.is_empty());
    }
}
