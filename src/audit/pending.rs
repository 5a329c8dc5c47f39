//! Pending audit entries
//!
//! A `PendingEntry` lives for one save operation only. It keeps the entity
//! reference next to the record so key values can be read after the primary
//! commit has populated generated keys.

use crate::models::AuditRecord;
use crate::tracking::EntityRef;

/// An audit record awaiting key resolution
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub record: AuditRecord,
    pub entity: EntityRef,
}

impl PendingEntry {
    pub fn new(record: AuditRecord, entity: EntityRef) -> Self {
        Self { record, entity }
    }

    /// True when the formatted old and new values differ
    pub fn has_changed(&self) -> bool {
        self.record.has_changed()
    }
}
