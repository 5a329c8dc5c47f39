//! Strongly-typed identifiers used by the audit trail
//!
//! A batch identifier correlates every audit record written by one save
//! operation. It wraps a UUID so that two saves never collide.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Correlation id shared by all records of one save operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Create a new random batch ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The unset batch ID; rejected by the entry builder
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Create a batch ID from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Whether this is the unset ID
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Short form for table output
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }

    /// Parse a batch ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BatchId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim())
    }
}
