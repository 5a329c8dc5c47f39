//! Key resolution
//!
//! Reads an entity's business/primary key after the primary commit and renders
//! it as two comma-joined columns: the key field names and their formatted
//! values. Each name is paired with its value before anything is dropped, so a
//! key field without an accessor disappears from both lists at once.

use crate::error::AuditResult;
use crate::tracking::{EntityRef, SchemaMetadata};

use super::format::format_key_value;

/// Rendered key of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedKey {
    /// Comma-joined key field names
    pub members: String,
    /// Comma-joined formatted key values, in the same order
    pub values: String,
}

/// Resolves entity keys through schema metadata
pub struct KeyResolver<'a, M: SchemaMetadata + ?Sized> {
    metadata: &'a M,
}

impl<'a, M: SchemaMetadata + ?Sized> KeyResolver<'a, M> {
    pub fn new(metadata: &'a M) -> Self {
        Self { metadata }
    }

    /// Resolve the key of an entity
    ///
    /// Unknown types resolve to an empty key.
    pub fn resolve(&self, entity: &EntityRef) -> AuditResult<ResolvedKey> {
        let declared_type = self.metadata.declared_type(entity.type_name());

        let Some(key_members) = self.metadata.key_members(&declared_type)? else {
            tracing::debug!(type_name = %declared_type, "no key metadata for type");
            return Ok(ResolvedKey::default());
        };

        let pairs: Vec<(String, String)> = key_members
            .into_iter()
            .filter_map(|member| {
                let Some(accessor) = self.metadata.accessor(&declared_type, &member) else {
                    tracing::debug!(type_name = %declared_type, field = %member, "key field has no accessor");
                    return None;
                };
                let value = accessor.read(entity)?;
                Some((member, format_key_value(&value)))
            })
            .collect();

        Ok(ResolvedKey {
            members: join(pairs.iter().map(|(member, _)| member.as_str())),
            values: join(pairs.iter().map(|(_, value)| value.as_str())),
        })
    }
}

fn join<'s>(parts: impl Iterator<Item = &'s str>) -> String {
    parts.collect::<Vec<_>>().join(",")
}
