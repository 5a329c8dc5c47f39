//! Entry builder
//!
//! Turns one tracked entity into one pending audit entry per field. Deleted
//! entities are walked through their original values, since their current
//! values may already be stripped; all other states use the current values.

use chrono::{DateTime, Utc};

use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecord, BatchId, ChangeState, FieldValues};
use crate::tracking::EntityEntry;

use super::exclusions::AuditExclusions;
use super::format::format_value;
use super::pending::PendingEntry;

/// Builds the field-level entries of one tracked entity
#[derive(Debug)]
pub struct EntryBuilder<'a> {
    entry: &'a EntityEntry,
    username: &'a str,
    timestamp: DateTime<Utc>,
    batch_id: BatchId,
    exclusions: Option<&'a AuditExclusions>,
}

impl<'a> EntryBuilder<'a> {
    /// Create a builder for one entry
    ///
    /// # Errors
    ///
    /// `NullReference` when no entry is given, `InvalidArgument` when the
    /// username is empty or the batch id is nil.
    pub fn new(
        entry: Option<&'a EntityEntry>,
        username: &'a str,
        timestamp: DateTime<Utc>,
        batch_id: BatchId,
    ) -> AuditResult<Self> {
        let entry = entry.ok_or(AuditError::NullReference("entity entry"))?;

        if username.is_empty() {
            return Err(AuditError::invalid_argument("username", "must not be empty"));
        }

        if batch_id.is_nil() {
            return Err(AuditError::invalid_argument("batch_id", "must be set"));
        }

        Ok(Self {
            entry,
            username,
            timestamp,
            batch_id,
            exclusions: None,
        })
    }

    /// Skip excluded types and fields
    pub fn with_exclusions(mut self, exclusions: &'a AuditExclusions) -> Self {
        self.exclusions = Some(exclusions);
        self
    }

    /// Simple type name recorded as `objectType`
    pub fn object_type(&self) -> &'a str {
        self.entry.entity.simple_type_name()
    }

    /// Produce one pending entry per audited field
    pub fn build(&self) -> Vec<PendingEntry> {
        let object_type = self.object_type();

        if self
            .exclusions
            .is_some_and(|exclusions| exclusions.is_type_ignored(object_type))
        {
            tracing::trace!(object_type, "type excluded from audit");
            return Vec::new();
        }

        let state = self.entry.state;
        let action = state.to_string();

        self.field_source()
            .names()
            .filter(|field| !self.is_ignored(object_type, field))
            .map(|field| {
                let record = AuditRecord {
                    id: 0,
                    batch_id: self.batch_id,
                    object_type: object_type.to_string(),
                    key_members: String::new(),
                    key_values: String::new(),
                    action: action.clone(),
                    property: field.to_string(),
                    old_value: self.old_value(field),
                    new_value: self.new_value(field),
                    username: self.username.to_string(),
                    utc_date: self.timestamp,
                };
                PendingEntry::new(record, self.entry.entity.clone())
            })
            .collect()
    }

    fn field_source(&self) -> &'a FieldValues {
        match self.entry.state {
            ChangeState::Deleted => &self.entry.original_values,
            _ => &self.entry.current_values,
        }
    }

    fn is_ignored(&self, object_type: &str, field: &str) -> bool {
        self.exclusions
            .is_some_and(|exclusions| exclusions.is_property_ignored(object_type, field))
    }

    fn old_value(&self, field: &str) -> Option<String> {
        if !self.entry.state.records_old_values() {
            return None;
        }
        self.entry.original_values.get(field).and_then(format_value)
    }

    fn new_value(&self, field: &str) -> Option<String> {
        if !self.entry.state.records_new_values() {
            return None;
        }
        self.entry.current_values.get(field).and_then(format_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{order_entry, Order};

    fn build(entry: &EntityEntry) -> Vec<PendingEntry> {
        EntryBuilder::new(Some(entry), "alice", Utc::now(), BatchId::new())
            .unwrap()
            .build()
    }

    fn find<'a>(entries: &'a [PendingEntry], field: &str) -> &'a AuditRecord {
        &entries
            .iter()
            .find(|e| e.record.property == field)
            .unwrap()
            .record
    }

    #[test]
    fn test_missing_entry_is_null_reference() {
        let err = EntryBuilder::new(None, "alice", Utc::now(), BatchId::new()).unwrap_err();
        assert!(matches!(err, AuditError::NullReference(_)));
    }

    #[test]
    fn test_empty_username_is_invalid() {
        let (_handle, entry) = order_entry(ChangeState::Added, None, &Order::new("Open"));
        let err = EntryBuilder::new(Some(&entry), "", Utc::now(), BatchId::new()).unwrap_err();
        assert!(matches!(err, AuditError::InvalidArgument { name: "username", .. }));
    }

    #[test]
    fn test_nil_batch_id_is_invalid() {
        let (_handle, entry) = order_entry(ChangeState::Added, None, &Order::new("Open"));
        let err = EntryBuilder::new(Some(&entry), "alice", Utc::now(), BatchId::nil()).unwrap_err();
        assert!(matches!(err, AuditError::InvalidArgument { name: "batch_id", .. }));
    }

    #[test]
    fn test_added_has_only_new_values() {
        let (_handle, entry) = order_entry(ChangeState::Added, None, &Order::new("Open"));
        let entries = build(&entry);

        assert_eq!(entries.len(), 4);
        for e in &entries {
            assert_eq!(e.record.action, "Added");
            assert!(e.record.old_value.is_none());
        }
        assert_eq!(find(&entries, "Status").new_value.as_deref(), Some("\"Open\""));
        assert_eq!(find(&entries, "Notes").new_value, None);
    }

    #[test]
    fn test_deleted_uses_original_fields_and_old_values() {
        let order = Order {
            order_id: 9,
            ..Order::new("Closed")
        };
        let (_handle, entry) = order_entry(ChangeState::Deleted, Some(&order), &order);
        assert!(entry.current_values.is_empty());

        let entries = build(&entry);
        assert_eq!(entries.len(), 4);
        for e in &entries {
            assert_eq!(e.record.action, "Deleted");
            assert!(e.record.new_value.is_none());
        }
        assert_eq!(find(&entries, "OrderId").old_value.as_deref(), Some("9"));
    }

    #[test]
    fn test_modified_has_both_values() {
        let before = Order {
            order_id: 1,
            ..Order::new("Open")
        };
        let after = Order {
            order_id: 1,
            ..Order::new("Closed")
        };
        let (_handle, entry) = order_entry(ChangeState::Modified, Some(&before), &after);
        let entries = build(&entry);

        let status = find(&entries, "Status");
        assert_eq!(status.object_type, "Order");
        assert_eq!(status.old_value.as_deref(), Some("\"Open\""));
        assert_eq!(status.new_value.as_deref(), Some("\"Closed\""));
        assert!(status.has_changed());
        assert!(!find(&entries, "Total").has_changed());
    }

    #[test]
    fn test_entries_share_batch_and_timestamp() {
        let (_handle, entry) = order_entry(ChangeState::Added, None, &Order::new("Open"));
        let batch_id = BatchId::new();
        let timestamp = Utc::now();

        let entries = EntryBuilder::new(Some(&entry), "bob", timestamp, batch_id)
            .unwrap()
            .build();

        for e in &entries {
            assert_eq!(e.record.batch_id, batch_id);
            assert_eq!(e.record.utc_date, timestamp);
            assert_eq!(e.record.username, "bob");
            assert!(e.entity.same_instance(&entry.entity));
        }
    }

    #[test]
    fn test_excluded_field_skipped() {
        let (_handle, entry) = order_entry(ChangeState::Added, None, &Order::new("Open"));
        let mut exclusions = AuditExclusions::new();
        exclusions.ignore_property("Order", "Notes");

        let entries = EntryBuilder::new(Some(&entry), "alice", Utc::now(), BatchId::new())
            .unwrap()
            .with_exclusions(&exclusions)
            .build();

        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.record.property != "Notes"));
    }

    #[test]
    fn test_excluded_type_yields_nothing() {
        let (_handle, entry) = order_entry(ChangeState::Added, None, &Order::new("Open"));
        let mut exclusions = AuditExclusions::new();
        exclusions.ignore_type("Order");

        let entries = EntryBuilder::new(Some(&entry), "alice", Utc::now(), BatchId::new())
            .unwrap()
            .with_exclusions(&exclusions)
            .build();

        assert!(entries.is_empty());
    }
}
