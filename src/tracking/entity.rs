//! Entity models and typed field accessors
//!
//! Every audited type implements [`Model`], declaring its name, its key fields
//! and an [`Accessors`] map from field name to getter. The registry turns that
//! map into type-erased [`FieldAccessor`]s once, at registration time.
//!
//! Tracked entities are shared as `Arc<RwLock<T>>` ([`Shared`]) so that values
//! written during a commit (generated identities) are visible to the code that
//! reads keys afterwards.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::models::{FieldValue, FieldValues};

/// Shared handle to a tracked entity
pub type Shared<T> = Arc<RwLock<T>>;

/// Getter for one field of a model
pub type Getter<T> = fn(&T) -> FieldValue;

type AnyInstance = dyn Any + Send + Sync;
type ErasedGetter = Arc<dyn Fn(&AnyInstance) -> Option<FieldValue> + Send + Sync>;

/// A persisted domain type whose fields can be audited
pub trait Model: Sized + Send + Sync + 'static {
    /// Declared type name, used as the audit `objectType`
    const TYPE_NAME: &'static str;

    /// Ordered business/primary key field names
    const KEY_MEMBERS: &'static [&'static str];

    /// Key field populated by the store when the entity is first committed
    const IDENTITY: Option<&'static str> = None;

    /// Exclude the whole type from auditing
    const AUDIT_IGNORED: bool = false;

    /// Field getters in declaration order
    ///
    /// Start the chain with `Accessors::<Self>::new()` so the getter closures
    /// know their argument type.
    fn accessors() -> Accessors<Self>;

    /// Fields excluded from auditing
    fn ignored_fields() -> &'static [&'static str] {
        &[]
    }

    /// Store the identity generated for a newly inserted entity
    fn assign_identity(&mut self, _identity: i64) {}
}

/// Ordered map from field name to getter for one model type
pub struct Accessors<T> {
    fields: Vec<(&'static str, Getter<T>)>,
}

impl<T> Accessors<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field getter
    pub fn field(mut self, name: &'static str, getter: Getter<T>) -> Self {
        self.fields.push((name, getter));
        self
    }

    /// Look up a getter by field name
    pub fn get(&self, name: &str) -> Option<Getter<T>> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, getter)| *getter)
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(n, _)| *n)
    }

    /// Read every field of an entity
    pub fn snapshot(&self, entity: &T) -> FieldValues {
        self.fields
            .iter()
            .map(|(name, getter)| (*name, getter(entity)))
            .collect()
    }

    pub(crate) fn into_fields(self) -> Vec<(&'static str, Getter<T>)> {
        self.fields
    }
}

impl<T> Default for Accessors<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased reference to a tracked entity instance
#[derive(Clone)]
pub struct EntityRef {
    runtime_type: String,
    instance: Arc<AnyInstance>,
}

impl EntityRef {
    /// Erase a shared model handle
    pub fn new<T: Model>(handle: &Shared<T>) -> Self {
        let instance: Arc<AnyInstance> = handle.clone();
        Self {
            runtime_type: T::TYPE_NAME.to_string(),
            instance,
        }
    }

    /// Override the runtime type name, as a proxying layer would
    pub fn with_runtime_type(mut self, runtime_type: impl Into<String>) -> Self {
        self.runtime_type = runtime_type.into();
        self
    }

    /// Runtime type name (may be a proxy alias)
    pub fn type_name(&self) -> &str {
        &self.runtime_type
    }

    /// Runtime type name without any module path
    pub fn simple_type_name(&self) -> &str {
        self.runtime_type
            .rsplit("::")
            .next()
            .unwrap_or(&self.runtime_type)
    }

    /// Recover the typed handle
    pub fn downcast<T: Model>(&self) -> Option<Shared<T>> {
        self.instance.clone().downcast::<RwLock<T>>().ok()
    }

    /// Whether both references point at the same instance
    pub fn same_instance(&self, other: &EntityRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.instance), Arc::as_ptr(&other.instance))
    }

    pub(crate) fn instance(&self) -> &AnyInstance {
        self.instance.as_ref()
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("runtime_type", &self.runtime_type)
            .finish_non_exhaustive()
    }
}

/// Type-erased getter for one field of one registered type
#[derive(Clone)]
pub struct FieldAccessor {
    name: String,
    getter: ErasedGetter,
}

impl FieldAccessor {
    /// Wrap a typed getter
    pub fn of<T: Model>(name: &str, getter: Getter<T>) -> Self {
        let getter: ErasedGetter = Arc::new(move |instance: &AnyInstance| {
            let lock = instance.downcast_ref::<RwLock<T>>()?;
            let entity = lock.read().ok()?;
            Some(getter(&entity))
        });

        Self {
            name: name.to_string(),
            getter,
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the field from an entity
    ///
    /// Returns `None` if the entity is not of the accessor's type or its lock
    /// is poisoned.
    pub fn read(&self, entity: &EntityRef) -> Option<FieldValue> {
        (self.getter)(entity.instance())
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
