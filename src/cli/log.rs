//! CLI commands for browsing the audit log

use clap::Subcommand;

use crate::display::{format_batch_summary, format_record_details, format_record_list};
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecord, BatchId};
use crate::storage::Storage;

/// Audit log subcommands
#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Show the most recent audit records
    Recent {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Only show records for this entity type
        #[arg(short = 't', long = "type")]
        object_type: Option<String>,
    },

    /// Show every record written by one save
    Batch {
        /// Batch ID (full or unique prefix)
        batch_id: String,
    },

    /// Summarize the most recent saves
    Batches {
        /// Number of saves to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show one record in detail
    Show {
        /// Record ID
        id: u64,
    },

    /// Show the number of records in the log
    Count,
}

/// Handle audit log commands
pub fn handle_log_command(storage: &Storage, cmd: LogCommands) -> AuditResult<()> {
    let log = &storage.audit_log;

    match cmd {
        LogCommands::Recent { limit, object_type } => {
            let records = match object_type {
                Some(object_type) => {
                    let mut matching: Vec<_> = log
                        .read_all()?
                        .into_iter()
                        .filter(|r| r.object_type == object_type)
                        .collect();
                    let start = matching.len().saturating_sub(limit);
                    matching.split_off(start)
                }
                None => log.read_recent(limit)?,
            };
            println!("{}", format_record_list(&records));
        }
        LogCommands::Batch { batch_id } => {
            let records = log.read_all()?;
            let batch_id = resolve_batch(&records, &batch_id)?;
            let batch: Vec<_> = records
                .into_iter()
                .filter(|r| r.batch_id == batch_id)
                .collect();

            println!("Batch {} ({} records)", batch_id, batch.len());
            println!("{}", format_record_list(&batch));
        }
        LogCommands::Batches { limit } => {
            let records = log.read_all()?;
            let recent = recent_batches(&records, limit);
            let selected: Vec<_> = records
                .into_iter()
                .filter(|r| recent.contains(&r.batch_id))
                .collect();
            println!("{}", format_batch_summary(&selected));
        }
        LogCommands::Show { id } => {
            let record = log
                .read_all()?
                .into_iter()
                .find(|r| r.id == id)
                .ok_or_else(|| AuditError::invalid_argument("id", format!("no audit record #{}", id)))?;
            print!("{}", format_record_details(&record));
        }
        LogCommands::Count => {
            println!("{}", log.entry_count()?);
        }
    }

    Ok(())
}

/// Resolve a full batch ID or a unique prefix of one
pub fn resolve_batch(records: &[AuditRecord], query: &str) -> AuditResult<BatchId> {
    if let Ok(batch_id) = BatchId::parse(query) {
        return Ok(batch_id);
    }

    let query = query.to_lowercase();
    let mut matches: Vec<BatchId> = records
        .iter()
        .map(|r| r.batch_id)
        .filter(|id| id.to_string().starts_with(&query))
        .collect();
    matches.sort();
    matches.dedup();

    match matches.as_slice() {
        [batch_id] => Ok(*batch_id),
        [] => Err(AuditError::invalid_argument(
            "batch",
            format!("no batch matches '{}'", query),
        )),
        _ => Err(AuditError::invalid_argument(
            "batch",
            format!("'{}' matches {} batches", query, matches.len()),
        )),
    }
}

/// Batch IDs of the last `limit` saves in the log
fn recent_batches(records: &[AuditRecord], limit: usize) -> Vec<BatchId> {
    let mut order: Vec<BatchId> = Vec::new();
    for record in records {
        if !order.contains(&record.batch_id) {
            order.push(record.batch_id);
        }
    }
    let start = order.len().saturating_sub(limit);
    order.split_off(start)
}
