//! Core data models for entity-auditor
//!
//! Field values as read from tracked entities, the change state of an entity,
//! and the audit record written for every changed field.

pub mod ids;
pub mod record;
pub mod state;
pub mod value;
pub mod values;

pub use ids::BatchId;
pub use record::AuditRecord;
pub use state::ChangeState;
pub use value::FieldValue;
pub use values::FieldValues;
