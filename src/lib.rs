//! entity-auditor - field-level change auditing for unit-of-work sessions
//!
//! Every save of an audited session writes one audit record per changed field
//! of every added, modified or deleted entity. All records of one save share a
//! batch id, a timestamp and the acting user. Keys generated by the store are
//! resolved after the primary commit, so new entities are audited with their
//! real identity.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path management and audit settings
//! - `error`: Custom error types
//! - `models`: Field values, change states and the audit record
//! - `tracking`: Model trait, schema registry and persistence-layer traits
//! - `audit`: Entry builder, key resolver and batch recorder
//! - `storage`: JSON entity store, JSONL audit log and the session
//! - `export`: CSV, JSON and YAML exports of the audit log
//! - `display` / `cli`: terminal output for the `auditor` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use entity_auditor::config::{AuditSettings, AuditorPaths};
//!
//! let paths = AuditorPaths::new()?;
//! let settings = AuditSettings::load_or_create(&paths)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod storage;
pub mod tracking;

#[cfg(test)]
mod test_support;

pub use error::{AuditError, AuditResult};
