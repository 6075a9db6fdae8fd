//! Seed data shared by the unit tests

use shared::models::{
    Event, EventStatus, Item, Location, LocationItem, LocationType, Order, OrderStatus, Priority,
    Unit,
};

use crate::db::MemoryStore;
use crate::tenant::TenantContext;

pub const EVENT: &str = "evt-1";
pub const BAR: &str = "loc-bar";
pub const BAR_PUBLIC: &str = "pub-bar";
pub const BEER: &str = "item-beer";
pub const WATER: &str = "item-water";
/// Exists but is not assigned to the bar
pub const CHIPS: &str = "item-chips";

pub fn ctx() -> TenantContext {
    TenantContext::new(EVENT)
}

/// One active event with a bar that may order beer and water
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_event(Event {
        id: EVENT.into(),
        name: "Summer Fest".into(),
        status: EventStatus::Active,
        created_at: 1_000,
    });
    store.add_location(location(BAR, BAR_PUBLIC, true));
    for (id, name) in [(BEER, "Beer"), (WATER, "Water"), (CHIPS, "Chips")] {
        store.add_item(Item {
            id: id.into(),
            name: name.into(),
            category: "drinks".into(),
            subcategory: None,
            default_unit: Unit::Case,
            pack_size: Some(24),
            active: true,
        });
    }
    for (sort, item) in [(2, BEER), (1, WATER)] {
        store.assign_item(LocationItem {
            event_id: EVENT.into(),
            location_id: BAR.into(),
            item_id: item.into(),
            active: true,
            sort,
        });
    }
    store
}

pub fn location(id: &str, public_id: &str, active: bool) -> Location {
    Location {
        id: id.into(),
        public_id: public_id.into(),
        name: format!("Stand {id}"),
        location_type: LocationType::Bar,
        active,
        pin_hash: None,
        event_id: EVENT.into(),
    }
}

pub fn order(id: &str, status: OrderStatus, priority: Priority, created_at: i64) -> Order {
    Order {
        id: id.into(),
        event_id: EVENT.into(),
        location_id: BAR.into(),
        status,
        priority,
        note: None,
        created_at,
        delivered_at: None,
        archived_at: None,
    }
}
