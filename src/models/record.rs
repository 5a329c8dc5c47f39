//! Audit record data structure
//!
//! One `AuditRecord` is one field-level change of one entity instance within
//! one save operation. Its serialized shape is the durable interface of the
//! audit log: `id, batchId, objectType, keyMembers, keyValues, action,
//! property, oldValue, newValue, username, utcDate`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::BatchId;

/// A single persisted audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Store-generated identifier (0 until committed)
    #[serde(default)]
    pub id: u64,

    /// Save operation this record belongs to
    pub batch_id: BatchId,

    /// Simple type name of the audited entity
    pub object_type: String,

    /// Comma-joined key field names
    #[serde(default)]
    pub key_members: String,

    /// Comma-joined formatted key values
    #[serde(default)]
    pub key_values: String,

    /// Added, Modified, Deleted or Unchanged
    pub action: String,

    /// Name of the changed field
    pub property: String,

    /// Formatted value before the change
    pub old_value: Option<String>,

    /// Formatted value after the change
    pub new_value: Option<String>,

    /// Actor that performed the save
    pub username: String,

    /// When the save started (UTC)
    pub utc_date: DateTime<Utc>,
}

impl AuditRecord {
    /// True when the formatted old and new values differ
    pub fn has_changed(&self) -> bool {
        self.old_value != self.new_value
    }

    /// Attach resolved key information
    pub fn set_key(&mut self, members: impl Into<String>, values: impl Into<String>) {
        self.key_members = members.into();
        self.key_values = values.into();
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {}",
            self.utc_date.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.object_type,
        );

        if !self.key_values.is_empty() {
            output.push_str(&format!(" ({}={})", self.key_members, self.key_values));
        }

        output.push_str(&format!(
            "\n  {}: {} -> {} by {}",
            self.property,
            self.old_value.as_deref().unwrap_or("(none)"),
            self.new_value.as_deref().unwrap_or("(none)"),
            self.username
        ));

        output
    }
}
