//! Audit record display formatting
//!
//! Formats audit records for terminal output in table, batch summary and
//! detail views.

use std::collections::BTreeMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{AuditRecord, BatchId};

/// Longest value shown in a table cell before truncation
const MAX_CELL_WIDTH: usize = 32;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Batch")]
    batch: String,
    #[tabled(rename = "Date (UTC)")]
    date: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Type")]
    object_type: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Old")]
    old_value: String,
    #[tabled(rename = "New")]
    new_value: String,
}

impl From<&AuditRecord> for RecordRow {
    fn from(record: &AuditRecord) -> Self {
        Self {
            id: record.id,
            batch: record.batch_id.short(),
            date: record.utc_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            username: record.username.clone(),
            action: record.action.clone(),
            object_type: record.object_type.clone(),
            key: format_key(record),
            property: record.property.clone(),
            old_value: format_cell(record.old_value.as_deref()),
            new_value: format_cell(record.new_value.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Batch")]
    batch: String,
    #[tabled(rename = "Date (UTC)")]
    date: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Records")]
    records: usize,
    #[tabled(rename = "Types")]
    object_types: String,
}

/// Format audit records as a table
pub fn format_record_list(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    Table::new(rows).with(Style::psql()).to_string()
}

/// Format one row per save operation, in order of first appearance
pub fn format_batch_summary(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let mut order: Vec<BatchId> = Vec::new();
    let mut batches: BTreeMap<String, Vec<&AuditRecord>> = BTreeMap::new();
    for record in records {
        let group = batches.entry(record.batch_id.to_string()).or_default();
        if group.is_empty() {
            order.push(record.batch_id);
        }
        group.push(record);
    }

    let rows: Vec<BatchRow> = order
        .iter()
        .filter_map(|batch_id| {
            let group = batches.get(&batch_id.to_string())?;
            let first = group.first()?;

            let mut object_types: Vec<&str> = group.iter().map(|r| r.object_type.as_str()).collect();
            object_types.sort_unstable();
            object_types.dedup();

            Some(BatchRow {
                batch: batch_id.short(),
                date: first.utc_date.format("%Y-%m-%d %H:%M:%S").to_string(),
                username: first.username.clone(),
                records: group.len(),
                object_types: object_types.join(", "),
            })
        })
        .collect();

    Table::new(rows).with(Style::psql()).to_string()
}

/// Format a single record's details
pub fn format_record_details(record: &AuditRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Audit record #{}\n", record.id));
    output.push_str(&format!("  Batch:     {}\n", record.batch_id));
    output.push_str(&format!(
        "  Date:      {}\n",
        record.utc_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("  User:      {}\n", record.username));
    output.push_str(&format!("  Action:    {}\n", record.action));
    output.push_str(&format!("  Type:      {}\n", record.object_type));
    output.push_str(&format!("  Key:       {}\n", format_key(record)));
    output.push_str(&format!("  Property:  {}\n", record.property));
    output.push_str(&format!(
        "  Old value: {}\n",
        record.old_value.as_deref().unwrap_or("(none)")
    ));
    output.push_str(&format!(
        "  New value: {}\n",
        record.new_value.as_deref().unwrap_or("(none)")
    ));

    output
}

fn format_key(record: &AuditRecord) -> String {
    if record.key_members.is_empty() {
        return "-".to_string();
    }
    format!("{}={}", record.key_members, record.key_values)
}

fn format_cell(value: Option<&str>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v.chars().count() > MAX_CELL_WIDTH => {
            let truncated: String = v.chars().take(MAX_CELL_WIDTH - 3).collect();
            format!("{}...", truncated)
        }
        Some(v) => v.to_string(),
    }
}
