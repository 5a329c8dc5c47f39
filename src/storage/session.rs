//! Unit-of-work session over the file-backed stores
//!
//! A `Session` tracks entity handles, detects modifications by comparing each
//! entity against the snapshot it was attached or last committed with, and
//! commits everything pending in one `save_changes`. Identities of added
//! entities are generated during that commit. Audit records queued through
//! [`UnitOfWork::add_audit_record`] are appended to the audit log on the next
//! commit.

use std::sync::{Arc, RwLock};

use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecord, ChangeState, FieldValue, FieldValues};
use crate::tracking::{
    ChangeTracker, EntityEntry, EntityRef, Model, SchemaRegistry, Shared, TypeSchema, UnitOfWork,
};

use super::Storage;

/// One tracked entity
struct Tracked {
    entity: EntityRef,
    state: ChangeState,
    original: FieldValues,
}

/// Change-tracking session
pub struct Session {
    registry: Arc<SchemaRegistry>,
    storage: Storage,
    tracked: Vec<Tracked>,
    pending_audit: Vec<AuditRecord>,
}

impl Session {
    /// Create a session over loaded storage
    pub fn new(registry: Arc<SchemaRegistry>, storage: Storage) -> Self {
        Self {
            registry,
            storage,
            tracked: Vec::new(),
            pending_audit: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Track a new entity, to be inserted on the next commit
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the type is not registered.
    pub fn add<T: Model>(&mut self, entity: T) -> AuditResult<Shared<T>> {
        self.registry.require(T::TYPE_NAME)?;

        let handle = Arc::new(RwLock::new(entity));
        self.tracked.push(Tracked {
            entity: EntityRef::new(&handle),
            state: ChangeState::Added,
            original: FieldValues::new(),
        });
        Ok(handle)
    }

    /// Track an existing entity as unchanged
    ///
    /// Attaching an already tracked handle is a no-op.
    pub fn attach<T: Model>(&mut self, handle: &Shared<T>) -> AuditResult<()> {
        let entity = EntityRef::new(handle);
        if self.position(&entity).is_some() {
            return Ok(());
        }

        let schema = self.registry.require(T::TYPE_NAME)?;
        let original = snapshot(schema, &entity)?;
        self.tracked.push(Tracked {
            entity,
            state: ChangeState::Unchanged,
            original,
        });
        Ok(())
    }

    /// Mark an entity for deletion
    ///
    /// Removing an entity added in this session simply stops tracking it.
    pub fn remove<T: Model>(&mut self, handle: &Shared<T>) -> AuditResult<()> {
        let entity = EntityRef::new(handle);

        let index = match self.position(&entity) {
            Some(index) => index,
            None => {
                self.attach(handle)?;
                self.tracked.len() - 1
            }
        };

        if self.tracked[index].state == ChangeState::Added {
            self.tracked.remove(index);
        } else {
            self.tracked[index].state = ChangeState::Deleted;
        }
        Ok(())
    }

    /// Current state of a tracked entity, or `None` if untracked
    pub fn state_of<T: Model>(&self, handle: &Shared<T>) -> AuditResult<Option<ChangeState>> {
        let entity = EntityRef::new(handle);
        let Some(index) = self.position(&entity) else {
            return Ok(None);
        };

        let tracked = &self.tracked[index];
        match tracked.state {
            ChangeState::Unchanged | ChangeState::Modified => {
                let schema = self.registry.require(entity.type_name())?;
                let current = snapshot(schema, &entity)?;
                Ok(Some(modified_state(&tracked.original, &current)))
            }
            state => Ok(Some(state)),
        }
    }

    /// Re-evaluate unchanged/modified entities against their snapshots
    pub fn detect_changes(&mut self) -> AuditResult<()> {
        let Self {
            registry, tracked, ..
        } = self;

        for t in tracked.iter_mut() {
            if matches!(t.state, ChangeState::Unchanged | ChangeState::Modified) {
                let schema = registry.require(t.entity.type_name())?;
                let current = snapshot(schema, &t.entity)?;
                t.state = modified_state(&t.original, &current);
            }
        }
        Ok(())
    }

    /// Number of tracked entities
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Number of audit records waiting for the next commit
    pub fn pending_audit_count(&self) -> usize {
        self.pending_audit.len()
    }

    fn position(&self, entity: &EntityRef) -> Option<usize> {
        self.tracked
            .iter()
            .position(|t| t.entity.same_instance(entity))
    }

    fn commit_entities(&mut self) -> AuditResult<usize> {
        let entities = &self.storage.entities;
        let mut committed = 0;

        for t in self.tracked.iter().filter(|t| t.state.has_pending_change()) {
            let schema = self.registry.require(t.entity.type_name())?;

            match t.state {
                ChangeState::Added => {
                    self.generate_identity(schema, &t.entity)?;
                    let values = snapshot(schema, &t.entity)?;
                    let key = row_key(schema, &values)?;
                    entities.upsert(schema.name(), &key, values)?;
                }
                ChangeState::Modified => {
                    let values = snapshot(schema, &t.entity)?;
                    let key = row_key(schema, &values)?;
                    let old_key = row_key(schema, &t.original)?;
                    if old_key != key {
                        entities.remove(schema.name(), &old_key)?;
                    }
                    entities.upsert(schema.name(), &key, values)?;
                }
                ChangeState::Deleted => {
                    let key = row_key(schema, &t.original)?;
                    entities.remove(schema.name(), &key)?;
                }
                ChangeState::Unchanged => continue,
            }
            committed += 1;
        }

        if committed > 0 {
            entities.save()?;
        }

        self.accept_changes()?;
        Ok(committed)
    }

    fn generate_identity(&self, schema: &TypeSchema, entity: &EntityRef) -> AuditResult<()> {
        let Some(field) = schema.identity() else {
            return Ok(());
        };

        let current = schema.accessor(field).and_then(|a| a.read(entity));
        if !matches!(current, Some(FieldValue::Null) | Some(FieldValue::Integer(0))) {
            return Ok(());
        }

        let identity = self.storage.entities.next_identity(schema.name())?;
        if !schema.assign_identity(entity, identity) {
            return Err(AuditError::Persistence(format!(
                "Failed to assign identity to {}",
                schema.name()
            )));
        }

        tracing::debug!(type_name = schema.name(), identity, "generated identity");
        Ok(())
    }

    fn accept_changes(&mut self) -> AuditResult<()> {
        let Self {
            registry, tracked, ..
        } = self;

        tracked.retain(|t| t.state != ChangeState::Deleted);
        for t in tracked.iter_mut() {
            let schema = registry.require(t.entity.type_name())?;
            t.original = snapshot(schema, &t.entity)?;
            t.state = ChangeState::Unchanged;
        }
        Ok(())
    }

    fn commit_audit_records(&mut self) -> AuditResult<usize> {
        if self.pending_audit.is_empty() {
            return Ok(0);
        }

        // Taken up front: a failed append does not leave rows queued
        let mut records = std::mem::take(&mut self.pending_audit);
        self.storage.audit_log.append_batch(&mut records)?;
        Ok(records.len())
    }
}

impl ChangeTracker for Session {
    fn entries(&mut self) -> AuditResult<Vec<EntityEntry>> {
        self.detect_changes()?;

        self.tracked
            .iter()
            .map(|t| -> AuditResult<EntityEntry> {
                let current = match t.state {
                    ChangeState::Deleted => FieldValues::new(),
                    _ => snapshot(self.registry.require(t.entity.type_name())?, &t.entity)?,
                };
                Ok(EntityEntry::new(
                    t.state,
                    t.original.clone(),
                    current,
                    t.entity.clone(),
                ))
            })
            .collect()
    }
}

impl UnitOfWork for Session {
    /// Commit pending entity changes, then any queued audit records
    ///
    /// Returns the number of entity changes. Audit rows are not counted.
    fn save_changes(&mut self) -> AuditResult<usize> {
        self.detect_changes()?;

        let changes = self.commit_entities().map_err(into_persistence)?;
        let records = self.commit_audit_records().map_err(into_persistence)?;

        tracing::debug!(changes, records, "session committed");
        Ok(changes)
    }

    fn add_audit_record(&mut self, record: AuditRecord) -> AuditResult<()> {
        self.pending_audit.push(record);
        Ok(())
    }

    fn discard_audit_records(&mut self) -> usize {
        std::mem::take(&mut self.pending_audit).len()
    }
}

fn snapshot(schema: &TypeSchema, entity: &EntityRef) -> AuditResult<FieldValues> {
    schema.snapshot(entity).ok_or_else(|| {
        AuditError::Persistence(format!("Failed to read {} entity", schema.name()))
    })
}

fn modified_state(original: &FieldValues, current: &FieldValues) -> ChangeState {
    if original == current {
        ChangeState::Unchanged
    } else {
        ChangeState::Modified
    }
}

/// Row key of an entity: its key values joined with commas
fn row_key(schema: &TypeSchema, values: &FieldValues) -> AuditResult<String> {
    if schema.key_members().is_empty() {
        return Err(AuditError::Persistence(format!(
            "{} declares no key fields",
            schema.name()
        )));
    }

    let parts = schema
        .key_members()
        .iter()
        .map(|member| {
            values.get(member).map(ToString::to_string).ok_or_else(|| {
                AuditError::Persistence(format!("{} has no value for key field {}", schema.name(), member))
            })
        })
        .collect::<AuditResult<Vec<_>>>()?;

    Ok(parts.join(","))
}

fn into_persistence(err: AuditError) -> AuditError {
    match err {
        AuditError::Persistence(_) => err,
        other => AuditError::Persistence(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditorPaths;
    use crate::models::BatchId;
    use crate::test_support::{shared, Order};
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_session() -> (Session, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditorPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        let registry = Arc::new(SchemaRegistry::new().with::<Order>());
        (Session::new(registry, storage), temp_dir)
    }

    fn audit_record() -> AuditRecord {
        AuditRecord {
            id: 0,
            batch_id: BatchId::new(),
            object_type: "Order".to_string(),
            key_members: "OrderId".to_string(),
            key_values: "1".to_string(),
            action: "Added".to_string(),
            property: "Status".to_string(),
            old_value: None,
            new_value: Some("\"Open\"".to_string()),
            username: "alice".to_string(),
            utc_date: Utc::now(),
        }
    }

    #[test]
    fn test_add_unregistered_type_fails() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditorPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut session = Session::new(Arc::new(SchemaRegistry::new()), Storage::new(paths).unwrap());

        let result = session.add(Order::new("Open"));
        assert!(matches!(result, Err(AuditError::InvalidArgument { .. })));
    }

    #[test]
    fn test_add_assigns_identity_on_commit() {
        let (mut session, _temp) = create_test_session();
        let first = session.add(Order::new("Open")).unwrap();
        let second = session.add(Order::new("Open")).unwrap();

        assert_eq!(session.state_of(&first).unwrap(), Some(ChangeState::Added));
        let count = session.save_changes().unwrap();

        assert_eq!(count, 2);
        assert_eq!(first.read().unwrap().order_id, 1);
        assert_eq!(second.read().unwrap().order_id, 2);
        assert_eq!(session.state_of(&first).unwrap(), Some(ChangeState::Unchanged));
        assert_eq!(session.storage().entities.count("Order").unwrap(), 2);
    }

    #[test]
    fn test_explicit_identity_kept() {
        let (mut session, _temp) = create_test_session();
        let order = session
            .add(Order {
                order_id: 42,
                ..Order::new("Open")
            })
            .unwrap();

        session.save_changes().unwrap();
        assert_eq!(order.read().unwrap().order_id, 42);
        assert!(session.storage().entities.get("Order", "42").unwrap().is_some());
    }

    #[test]
    fn test_modification_detected() {
        let (mut session, _temp) = create_test_session();
        let order = session.add(Order::new("Open")).unwrap();
        session.save_changes().unwrap();

        order.write().unwrap().status = "Closed".to_string();
        assert_eq!(session.state_of(&order).unwrap(), Some(ChangeState::Modified));

        let entries = session.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].state, ChangeState::Modified);
        assert_eq!(entries[0].original_values.get("Status"), Some(&"Open".into()));
        assert_eq!(entries[0].current_values.get("Status"), Some(&"Closed".into()));

        assert_eq!(session.save_changes().unwrap(), 1);
        let row = session.storage().entities.get("Order", "1").unwrap().unwrap();
        assert_eq!(row.get("Status"), Some(&"Closed".into()));
    }

    #[test]
    fn test_reverted_change_is_unchanged() {
        let (mut session, _temp) = create_test_session();
        let order = session.add(Order::new("Open")).unwrap();
        session.save_changes().unwrap();

        order.write().unwrap().status = "Closed".to_string();
        order.write().unwrap().status = "Open".to_string();

        assert_eq!(session.state_of(&order).unwrap(), Some(ChangeState::Unchanged));
        assert_eq!(session.save_changes().unwrap(), 0);
    }

    #[test]
    fn test_remove_deletes_row_and_stops_tracking() {
        let (mut session, _temp) = create_test_session();
        let order = session.add(Order::new("Open")).unwrap();
        session.save_changes().unwrap();

        session.remove(&order).unwrap();
        let entries = session.entries().unwrap();
        assert_eq!(entries[0].state, ChangeState::Deleted);
        assert!(entries[0].current_values.is_empty());

        assert_eq!(session.save_changes().unwrap(), 1);
        assert_eq!(session.tracked_count(), 0);
        assert_eq!(session.storage().entities.count("Order").unwrap(), 0);
    }

    #[test]
    fn test_remove_added_entity_discards_it() {
        let (mut session, _temp) = create_test_session();
        let order = session.add(Order::new("Open")).unwrap();

        session.remove(&order).unwrap();
        assert_eq!(session.tracked_count(), 0);
        assert_eq!(session.save_changes().unwrap(), 0);
    }

    #[test]
    fn test_attach_is_idempotent() {
        let (mut session, _temp) = create_test_session();
        let order = shared(Order {
            order_id: 7,
            ..Order::new("Open")
        });

        session.attach(&order).unwrap();
        session.attach(&order).unwrap();
        assert_eq!(session.tracked_count(), 1);
        assert_eq!(session.state_of(&order).unwrap(), Some(ChangeState::Unchanged));
    }

    #[test]
    fn test_audit_records_committed_separately() {
        let (mut session, _temp) = create_test_session();
        session.add_audit_record(audit_record()).unwrap();
        assert_eq!(session.pending_audit_count(), 1);

        assert_eq!(session.save_changes().unwrap(), 0);
        assert_eq!(session.pending_audit_count(), 0);

        let log = session.storage().audit_log.read_all().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, 1);
    }

    #[test]
    fn test_failed_audit_append_drops_queue() {
        let (mut session, temp) = create_test_session();
        std::fs::create_dir(temp.path().join("audit.log")).unwrap();

        session.add_audit_record(audit_record()).unwrap();
        let err = session.save_changes().unwrap_err();

        assert!(err.is_persistence());
        assert_eq!(session.pending_audit_count(), 0);
    }

    #[test]
    fn test_queued_records_not_counted_as_changes() {
        let (mut session, _temp) = create_test_session();
        session.add(Order::new("Open")).unwrap();
        session.add_audit_record(audit_record()).unwrap();

        assert_eq!(session.save_changes().unwrap(), 1);
        assert_eq!(session.storage().audit_log.entry_count().unwrap(), 1);
    }

    #[test]
    fn test_discard_audit_records() {
        let (mut session, _temp) = create_test_session();
        session.add_audit_record(audit_record()).unwrap();
        session.add_audit_record(audit_record()).unwrap();

        assert_eq!(session.discard_audit_records(), 2);
        assert_eq!(session.pending_audit_count(), 0);

        session.save_changes().unwrap();
        assert!(session.storage().audit_log.read_all().unwrap().is_empty());
    }
}
