//! Shared fixtures for unit tests

use std::sync::{Arc, RwLock};

use crate::models::{ChangeState, FieldValues};
use crate::tracking::{Accessors, EntityEntry, EntityRef, Model, Shared};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub order_id: i64,
    pub status: String,
    pub total: f64,
    pub notes: Option<String>,
}

impl Order {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..Self::default()
        }
    }
}

impl Model for Order {
    const TYPE_NAME: &'static str = "Order";
    const KEY_MEMBERS: &'static [&'static str] = &["OrderId"];
    const IDENTITY: Option<&'static str> = Some("OrderId");

    fn accessors() -> Accessors<Self> {
        Accessors::<Self>::new()
            .field("OrderId", |o| o.order_id.into())
            .field("Status", |o| (&o.status).into())
            .field("Total", |o| o.total.into())
            .field("Notes", |o| o.notes.clone().into())
    }

    fn assign_identity(&mut self, identity: i64) {
        self.order_id = identity;
    }
}

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

pub fn snapshot(order: &Order) -> FieldValues {
    Order::accessors().snapshot(order)
}

/// Entry for an order, with original/current snapshots taken from the values given
pub fn order_entry(
    state: ChangeState,
    original: Option<&Order>,
    current: &Order,
) -> (Shared<Order>, EntityEntry) {
    let handle = shared(current.clone());
    let entry = EntityEntry::new(
        state,
        original.map(snapshot).unwrap_or_default(),
        if state == ChangeState::Deleted {
            FieldValues::new()
        } else {
            snapshot(current)
        },
        EntityRef::new(&handle),
    );
    (handle, entry)
}
