//! CLI command for exporting the audit log

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Args;

use crate::error::{AuditError, AuditResult};
use crate::export::{export_records, ExportFormat};
use crate::models::AuditRecord;
use crate::storage::Storage;

use super::log::resolve_batch;

/// Export arguments
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Only export records of this batch (full ID or unique prefix)
    #[arg(short, long)]
    pub batch: Option<String>,

    /// Only export records for this entity type
    #[arg(short = 't', long = "type")]
    pub object_type: Option<String>,
}

/// Handle the export command
pub fn handle_export_command(storage: &Storage, args: ExportArgs) -> AuditResult<()> {
    let records = select_records(storage.audit_log.read_all()?, &args)?;
    let count = records.len();

    match &args.output {
        Some(output) => {
            let file = File::create(output).map_err(|e| {
                AuditError::Export(format!(
                    "Failed to create file {}: {}",
                    output.display(),
                    e
                ))
            })?;
            let mut writer = BufWriter::new(file);
            export_records(args.format, records, &mut writer)?;
            writer
                .flush()
                .map_err(|e| AuditError::Export(e.to_string()))?;

            println!(
                "Exported {} audit records as {} to: {}",
                count,
                args.format,
                output.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            export_records(args.format, records, &mut writer)?;
            writer
                .flush()
                .map_err(|e| AuditError::Export(e.to_string()))?;
        }
    }

    tracing::debug!(count, format = %args.format, "exported audit records");
    Ok(())
}

fn select_records(records: Vec<AuditRecord>, args: &ExportArgs) -> AuditResult<Vec<AuditRecord>> {
    let batch_id = args
        .batch
        .as_deref()
        .map(|query| resolve_batch(&records, query))
        .transpose()?;

    Ok(records
        .into_iter()
        .filter(|r| batch_id.map_or(true, |id| r.batch_id == id))
        .filter(|r| {
            args.object_type
                .as_deref()
                .map_or(true, |t| r.object_type == t)
        })
        .collect())
}
