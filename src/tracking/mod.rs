//! Interfaces to the persistence layer
//!
//! The auditing pipeline never talks to a store directly. It consumes three
//! narrow capabilities:
//!
//! - [`ChangeTracker`]: the tracked entities and their pending changes
//! - [`SchemaMetadata`]: key fields and accessors of each entity type
//! - [`UnitOfWork`]: the commit itself, plus a queue for audit rows
//!
//! [`crate::storage::Session`] implements the tracker and unit of work on top
//! of the file-backed stores; [`SchemaRegistry`] implements the metadata.

pub mod entity;
pub mod entry;
pub mod schema;

pub use entity::{Accessors, EntityRef, FieldAccessor, Getter, Model, Shared};
pub use entry::EntityEntry;
pub use schema::{SchemaRegistry, TypeSchema};

use crate::audit::AuditExclusions;
use crate::error::AuditResult;
use crate::models::AuditRecord;

/// Source of tracked entities
pub trait ChangeTracker {
    /// All tracked entities with their state and value snapshots
    fn entries(&mut self) -> AuditResult<Vec<EntityEntry>>;
}

/// Schema metadata for entity types
pub trait SchemaMetadata {
    /// Resolve a runtime (possibly proxy) type name to its declared type
    fn declared_type(&self, runtime_type: &str) -> String;

    /// Ordered key field names of a declared type, `None` if unknown
    fn key_members(&self, declared_type: &str) -> AuditResult<Option<Vec<String>>>;

    /// Accessor for a field of a declared type
    fn accessor(&self, declared_type: &str, field: &str) -> Option<FieldAccessor>;

    /// Types and fields opted out of auditing
    fn exclusions(&self) -> AuditExclusions {
        AuditExclusions::default()
    }
}

/// Commit boundary of the persistence layer
pub trait UnitOfWork {
    /// Commit all pending changes, returning the number of affected rows
    fn save_changes(&mut self) -> AuditResult<usize>;

    /// Queue an audit record for the next commit
    fn add_audit_record(&mut self, record: AuditRecord) -> AuditResult<()>;

    /// Drop queued audit records without committing them, returning how many
    fn discard_audit_records(&mut self) -> usize;
}
