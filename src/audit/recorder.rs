//! Batch recorder
//!
//! Runs one save operation end to end:
//!
//! 1. collect field-level entries for every entity with a pending change,
//!    all sharing one batch id and timestamp
//! 2. commit the primary changes (generated keys become readable here)
//! 3. drop entries whose old and new values are equal, resolve keys for the
//!    rest, then queue them and commit them in a second, separate commit
//!
//! Failures in steps 1 and 3 are swallowed when `ignore_audit_log_exceptions`
//! is set. Rejected builder arguments and failures of the primary commit
//! always propagate. Records are queued only once every key has resolved, and
//! a failed step 3 discards whatever reached the queue, so no row of this
//! save leaks into the next commit. A failed audit commit never undoes the
//! primary commit.

use std::sync::Arc;

use chrono::Utc;

use crate::config::AuditSettings;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecord, BatchId};
use crate::tracking::{ChangeTracker, EntityEntry, SchemaMetadata, UnitOfWork};

use super::builder::EntryBuilder;
use super::exclusions::AuditExclusions;
use super::keys::KeyResolver;
use super::pending::PendingEntry;

/// Orchestrates audited saves for one actor
pub struct BatchRecorder {
    settings: AuditSettings,
    metadata: Arc<dyn SchemaMetadata + Send + Sync>,
    username: String,
    exclusions: AuditExclusions,
}

impl BatchRecorder {
    /// Create a recorder acting as `username`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty username, `Config` for malformed
    /// exclusions in the settings.
    pub fn new(
        settings: AuditSettings,
        metadata: Arc<dyn SchemaMetadata + Send + Sync>,
        username: impl Into<String>,
    ) -> AuditResult<Self> {
        let username = username.into();
        if username.is_empty() {
            return Err(AuditError::invalid_argument("username", "must not be empty"));
        }

        let mut exclusions = AuditExclusions::from_settings(&settings)?;
        exclusions.merge(metadata.exclusions());

        Ok(Self {
            settings,
            metadata,
            username,
            exclusions,
        })
    }

    /// Actor recorded on every entry
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Save all pending changes of `context`, auditing them
    ///
    /// Returns the number of primary changes committed; audit rows are never
    /// included in the count.
    pub fn save_changes<C>(&self, context: &mut C) -> AuditResult<usize>
    where
        C: ChangeTracker + UnitOfWork + ?Sized,
    {
        if !self.settings.use_audit_logging {
            tracing::debug!("audit logging disabled, committing without audit");
            return context.save_changes();
        }

        let pending = match context.entries() {
            Ok(entries) => self.build_entries(&entries)?,
            Err(err) => {
                self.absorb("collect", err)?;
                Vec::new()
            }
        };

        let change_count = context.save_changes()?;

        match self.record_entries(context, pending) {
            Ok(recorded) => {
                tracing::debug!(change_count, recorded, "audited save complete");
            }
            Err(err) => {
                let discarded = context.discard_audit_records();
                if discarded > 0 {
                    tracing::debug!(discarded, "dropped queued audit records");
                }
                self.absorb("record", err)?;
            }
        }

        Ok(change_count)
    }

    /// Pending entries for every changed entity, sharing one batch
    fn build_entries(&self, entries: &[EntityEntry]) -> AuditResult<Vec<PendingEntry>> {
        let timestamp = Utc::now();
        let batch_id = BatchId::new();
        let mut pending = Vec::new();

        for entry in entries.iter().filter(|e| e.state.has_pending_change()) {
            let builder = EntryBuilder::new(Some(entry), &self.username, timestamp, batch_id)?
                .with_exclusions(&self.exclusions);
            pending.extend(builder.build());
        }

        tracing::debug!(%batch_id, entries = pending.len(), "collected audit entries");
        Ok(pending)
    }

    fn record_entries<C>(&self, context: &mut C, pending: Vec<PendingEntry>) -> AuditResult<usize>
    where
        C: UnitOfWork + ?Sized,
    {
        let resolver = KeyResolver::new(self.metadata.as_ref());

        let records = pending
            .into_iter()
            .filter(PendingEntry::has_changed)
            .map(|PendingEntry { mut record, entity }| -> AuditResult<AuditRecord> {
                let key = resolver.resolve(&entity)?;
                record.set_key(key.members, key.values);
                Ok(record)
            })
            .collect::<AuditResult<Vec<_>>>()?;

        if records.is_empty() {
            return Ok(0);
        }

        let recorded = records.len();
        for record in records {
            context.add_audit_record(record)?;
        }
        context.save_changes()?;

        Ok(recorded)
    }

    fn absorb(&self, phase: &'static str, err: AuditError) -> AuditResult<()> {
        if !self.settings.ignore_audit_log_exceptions {
            return Err(err);
        }

        tracing::warn!(phase, error = %err, "ignoring audit failure");
        Ok(())
    }
}
