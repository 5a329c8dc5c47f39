//! Tracked entity entries as exposed by a change tracker

use crate::models::{ChangeState, FieldValues};

use super::entity::EntityRef;

/// One tracked entity with its pending change
#[derive(Debug, Clone)]
pub struct EntityEntry {
    /// Pending operation
    pub state: ChangeState,

    /// Values the entity was loaded or last committed with
    pub original_values: FieldValues,

    /// Values the entity holds now; may be empty for deletions
    pub current_values: FieldValues,

    /// The tracked instance itself
    pub entity: EntityRef,
}

impl EntityEntry {
    pub fn new(
        state: ChangeState,
        original_values: FieldValues,
        current_values: FieldValues,
        entity: EntityRef,
    ) -> Self {
        Self {
            state,
            original_values,
            current_values,
            entity,
        }
    }
}
