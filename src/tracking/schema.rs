//! Schema registry
//!
//! In-process schema metadata for registered [`Model`] types: key members,
//! accessor maps, identity columns and opt-outs. Proxy or generated type names
//! can be aliased to the declared type they stand in for.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::audit::AuditExclusions;
use crate::error::{AuditError, AuditResult};
use crate::models::FieldValues;

use super::entity::{EntityRef, FieldAccessor, Model};
use super::SchemaMetadata;

type AnyInstance = dyn Any + Send + Sync;
type ErasedSnapshot = Arc<dyn Fn(&AnyInstance) -> Option<FieldValues> + Send + Sync>;
type ErasedIdentity = Arc<dyn Fn(&AnyInstance, i64) -> bool + Send + Sync>;

/// Metadata for one registered type
#[derive(Clone)]
pub struct TypeSchema {
    name: String,
    key_members: Vec<String>,
    identity: Option<String>,
    accessors: Vec<FieldAccessor>,
    snapshot: ErasedSnapshot,
    assign_identity: ErasedIdentity,
}

impl TypeSchema {
    fn of<T: Model>() -> Self {
        let fields = T::accessors().into_fields();

        let accessors = fields
            .iter()
            .map(|(name, getter)| FieldAccessor::of::<T>(name, *getter))
            .collect();

        let snapshot: ErasedSnapshot = Arc::new(move |instance: &AnyInstance| {
            let lock = instance.downcast_ref::<RwLock<T>>()?;
            let entity = lock.read().ok()?;
            Some(
                fields
                    .iter()
                    .map(|(name, getter)| (*name, getter(&entity)))
                    .collect(),
            )
        });

        let assign_identity: ErasedIdentity = Arc::new(|instance: &AnyInstance, identity| {
            let Some(lock) = instance.downcast_ref::<RwLock<T>>() else {
                return false;
            };
            match lock.write() {
                Ok(mut entity) => {
                    entity.assign_identity(identity);
                    true
                }
                Err(_) => false,
            }
        });

        Self {
            name: T::TYPE_NAME.to_string(),
            key_members: T::KEY_MEMBERS.iter().map(|k| k.to_string()).collect(),
            identity: T::IDENTITY.map(str::to_string),
            accessors,
            snapshot,
            assign_identity,
        }
    }

    /// Declared type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered key field names
    pub fn key_members(&self) -> &[String] {
        &self.key_members
    }

    /// Store-generated key field, if any
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Accessor for a field
    pub fn accessor(&self, field: &str) -> Option<&FieldAccessor> {
        self.accessors.iter().find(|a| a.name() == field)
    }

    /// Read all fields of an entity of this type
    pub fn snapshot(&self, entity: &EntityRef) -> Option<FieldValues> {
        (self.snapshot)(entity.instance())
    }

    /// Write a generated identity into an entity of this type
    pub fn assign_identity(&self, entity: &EntityRef, identity: i64) -> bool {
        (self.assign_identity)(entity.instance(), identity)
    }
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("name", &self.name)
            .field("key_members", &self.key_members)
            .field("identity", &self.identity)
            .field("accessors", &self.accessors)
            .finish_non_exhaustive()
    }
}

/// Registry of audited types
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeSchema>,
    aliases: HashMap<String, String>,
    exclusions: AuditExclusions,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model type, building its accessor map
    pub fn register<T: Model>(&mut self) -> &mut Self {
        let schema = TypeSchema::of::<T>();

        if T::AUDIT_IGNORED {
            self.exclusions.ignore_type(T::TYPE_NAME);
        }
        for field in T::ignored_fields() {
            self.exclusions.ignore_property(T::TYPE_NAME, *field);
        }

        tracing::debug!(
            type_name = T::TYPE_NAME,
            fields = schema.accessors.len(),
            "registered model"
        );
        self.types.insert(schema.name.clone(), schema);
        self
    }

    /// Builder-style registration
    pub fn with<T: Model>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Map a proxy/generated runtime type name to its declared type
    pub fn register_alias(&mut self, runtime_type: impl Into<String>, declared_type: impl Into<String>) {
        self.aliases.insert(runtime_type.into(), declared_type.into());
    }

    /// Schema of a runtime or declared type
    pub fn schema(&self, type_name: &str) -> Option<&TypeSchema> {
        self.types.get(self.resolve(type_name))
    }

    /// Schema of a runtime or declared type, failing for unknown types
    pub fn require(&self, type_name: &str) -> AuditResult<&TypeSchema> {
        self.schema(type_name).ok_or_else(|| {
            AuditError::invalid_argument("type", format!("'{}' is not a registered model", type_name))
        })
    }

    /// Whether a type has been registered
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.schema(type_name).is_some()
    }

    fn resolve<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.aliases
            .get(type_name)
            .map(String::as_str)
            .unwrap_or(type_name)
    }
}

impl SchemaMetadata for SchemaRegistry {
    fn declared_type(&self, runtime_type: &str) -> String {
        self.resolve(runtime_type).to_string()
    }

    fn key_members(&self, declared_type: &str) -> AuditResult<Option<Vec<String>>> {
        if declared_type.is_empty() {
            return Err(AuditError::invalid_argument("type", "type name is empty"));
        }
        Ok(self
            .types
            .get(declared_type)
            .map(|schema| schema.key_members.clone()))
    }

    fn accessor(&self, declared_type: &str, field: &str) -> Option<FieldAccessor> {
        self.types
            .get(declared_type)
            .and_then(|schema| schema.accessor(field))
            .cloned()
    }

    fn exclusions(&self) -> AuditExclusions {
        self.exclusions.clone()
    }
}
