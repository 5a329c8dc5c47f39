//! Audited session
//!
//! A [`Session`] whose `save_changes` runs through a [`BatchRecorder`].
//! Everything else (add, attach, remove, queries) is the session's own API,
//! reachable through `Deref`.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::config::AuditSettings;
use crate::error::AuditResult;
use crate::storage::Session;
use crate::tracking::SchemaMetadata;

use super::recorder::BatchRecorder;

/// Session that writes an audit trail on every save
pub struct AuditedSession {
    session: Session,
    recorder: BatchRecorder,
}

impl AuditedSession {
    /// Wrap a session, auditing as the configured default user
    pub fn new(session: Session, settings: AuditSettings) -> AuditResult<Self> {
        let username = settings.default_username.clone();
        Self::with_username(session, settings, username)
    }

    /// Wrap a session, auditing as `username`
    pub fn with_username(
        session: Session,
        settings: AuditSettings,
        username: impl Into<String>,
    ) -> AuditResult<Self> {
        let metadata: Arc<dyn SchemaMetadata + Send + Sync> = session.registry().clone();
        let recorder = BatchRecorder::new(settings, metadata, username)?;
        Ok(Self { session, recorder })
    }

    /// Commit pending changes and their audit records
    ///
    /// Returns the number of entity changes committed.
    pub fn save_changes(&mut self) -> AuditResult<usize> {
        self.recorder.save_changes(&mut self.session)
    }

    pub fn recorder(&self) -> &BatchRecorder {
        &self.recorder
    }

    pub fn into_inner(self) -> Session {
        self.session
    }
}

impl Deref for AuditedSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl DerefMut for AuditedSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}
