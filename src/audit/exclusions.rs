//! Audit opt-outs
//!
//! Types and fields listed here never produce audit entries. The set is fed
//! from model declarations (`Model::AUDIT_IGNORED`, `Model::ignored_fields`)
//! and from the `ignored_types` / `ignored_properties` settings.

use std::collections::HashSet;

use crate::config::AuditSettings;
use crate::error::{AuditError, AuditResult};

/// Set of excluded types and `(type, field)` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditExclusions {
    types: HashSet<String>,
    properties: HashSet<(String, String)>,
}

impl AuditExclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from settings
    ///
    /// Properties must be written as `Type.Field`.
    pub fn from_settings(settings: &AuditSettings) -> AuditResult<Self> {
        let mut exclusions = Self::new();

        for type_name in &settings.ignored_types {
            exclusions.ignore_type(type_name.trim());
        }

        for property in &settings.ignored_properties {
            let (type_name, field) = property
                .split_once('.')
                .filter(|(t, f)| !t.trim().is_empty() && !f.trim().is_empty())
                .ok_or_else(|| {
                    AuditError::Config(format!(
                        "Ignored property '{}' must be written as Type.Field",
                        property
                    ))
                })?;
            exclusions.ignore_property(type_name.trim(), field.trim());
        }

        Ok(exclusions)
    }

    /// Exclude a whole type
    pub fn ignore_type(&mut self, type_name: impl Into<String>) {
        self.types.insert(type_name.into());
    }

    /// Exclude one field of a type
    pub fn ignore_property(&mut self, type_name: impl Into<String>, field: impl Into<String>) {
        self.properties.insert((type_name.into(), field.into()));
    }

    /// Whether the type is excluded
    pub fn is_type_ignored(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }

    /// Whether the field is excluded, directly or through its type
    pub fn is_property_ignored(&self, type_name: &str, field: &str) -> bool {
        self.is_type_ignored(type_name)
            || self
                .properties
                .contains(&(type_name.to_string(), field.to_string()))
    }

    /// Add every exclusion of `other`
    pub fn merge(&mut self, other: AuditExclusions) {
        self.types.extend(other.types);
        self.properties.extend(other.properties);
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.properties.is_empty()
    }
}
