//! Change-capture auditing
//!
//! Records one audit row per field of every entity created, modified or
//! deleted in a save, all rows of one save sharing a batch id.
//!
//! # Architecture
//!
//! - `EntryBuilder`: turns one tracked entity into pending field-level entries
//!   with formatted old/new values.
//! - `KeyResolver`: reads an entity's key after the primary commit, when
//!   store-generated identities are known.
//! - `BatchRecorder`: runs a save end to end (collect, commit, resolve keys,
//!   commit audit rows) and applies the error policy.
//! - `AuditedSession`: a storage session whose saves go through a recorder.
//!
//! # Example
//!
//! ```rust,ignore
//! use entity_auditor::audit::AuditedSession;
//! use entity_auditor::storage::{Session, Storage};
//!
//! let session = Session::new(Arc::new(registry), Storage::open(paths)?);
//! let mut audited = AuditedSession::with_username(session, settings, "alice")?;
//!
//! let order = audited.add(Order::new("Open"))?;
//! audited.save_changes()?;
//!
//! order.write().unwrap().status = "Closed".into();
//! audited.save_changes()?;
//! ```

mod builder;
mod context;
mod exclusions;
mod format;
mod keys;
mod pending;
mod recorder;

pub use builder::EntryBuilder;
pub use context::AuditedSession;
pub use exclusions::AuditExclusions;
pub use format::{format_key_value, format_value};
pub use keys::{KeyResolver, ResolvedKey};
pub use pending::PendingEntry;
pub use recorder::BatchRecorder;
