//! In-process store used by tests and local experiments
//!
//! All tables live behind one mutex; every conditional write checks and
//! mutates inside a single lock acquisition.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::{
    Event, EventStatus, Item, Location, LocationItem, Order, OrderLine, OrderStatus, Runner,
};

use super::{OrderLineDetail, Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    active_event_id: Option<String>,
    events: Vec<Event>,
    locations: Vec<Location>,
    items: Vec<Item>,
    location_items: Vec<LocationItem>,
    runners: Vec<Runner>,
    orders: Vec<Order>,
    lines: Vec<OrderLine>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_line_inserts: AtomicBool,
    fail_order_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Seeding ====================

    pub fn add_event(&self, event: Event) {
        self.tables.lock().events.push(event);
    }

    pub fn add_location(&self, location: Location) {
        self.tables.lock().locations.push(location);
    }

    pub fn add_item(&self, item: Item) {
        self.tables.lock().items.push(item);
    }

    /// Insert or replace the (event, location, item) assignment
    pub fn assign_item(&self, assignment: LocationItem) {
        let mut t = self.tables.lock();
        t.location_items.retain(|li| {
            !(li.event_id == assignment.event_id
                && li.location_id == assignment.location_id
                && li.item_id == assignment.item_id)
        });
        t.location_items.push(assignment);
    }

    pub fn add_runner(&self, runner: Runner) {
        self.tables.lock().runners.push(runner);
    }

    // ==================== Fault injection ====================

    /// Make every subsequent order-line insert fail
    pub fn fail_line_inserts(&self, fail: bool) {
        self.fail_line_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent order delete fail
    pub fn fail_order_deletes(&self, fail: bool) {
        self.fail_order_deletes.store(fail, Ordering::SeqCst);
    }

    // ==================== Inspection ====================

    pub fn order_count(&self) -> usize {
        self.tables.lock().orders.len()
    }

    pub fn line_count(&self) -> usize {
        self.tables.lock().lines.len()
    }

    pub fn lines_of(&self, order_id: &str) -> Vec<OrderLine> {
        self.tables
            .lock()
            .lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn active_event_id(&self) -> StoreResult<Option<String>> {
        Ok(self.tables.lock().active_event_id.clone())
    }

    async fn set_active_event_id(&self, event_id: &str) -> StoreResult<()> {
        self.tables.lock().active_event_id = Some(event_id.to_string());
        Ok(())
    }

    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>> {
        Ok(self.tables.lock().events.iter().find(|e| e.id == id).cloned())
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut events = self.tables.lock().events.clone();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn archive_event(&self, id: &str) -> StoreResult<bool> {
        let mut t = self.tables.lock();
        match t.events.iter_mut().find(|e| e.id == id) {
            Some(event) => {
                event.status = EventStatus::Archived;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_location(&self, id: &str) -> StoreResult<Option<Location>> {
        Ok(self.tables.lock().locations.iter().find(|l| l.id == id).cloned())
    }

    async fn find_location_by_public_id(
        &self,
        event_id: &str,
        public_id: &str,
    ) -> StoreResult<Option<Location>> {
        Ok(self
            .tables
            .lock()
            .locations
            .iter()
            .find(|l| l.event_id == event_id && l.public_id == public_id)
            .cloned())
    }

    async fn list_locations(&self, event_id: &str, ids: &[String]) -> StoreResult<Vec<Location>> {
        Ok(self
            .tables
            .lock()
            .locations
            .iter()
            .filter(|l| l.event_id == event_id && ids.contains(&l.id))
            .cloned()
            .collect())
    }

    async fn set_location_pin(&self, id: &str, pin_hash: &str) -> StoreResult<bool> {
        let mut t = self.tables.lock();
        match t.locations.iter_mut().find(|l| l.id == id) {
            Some(location) => {
                location.pin_hash = Some(pin_hash.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_locations(&self) -> StoreResult<i64> {
        Ok(self.tables.lock().locations.len() as i64)
    }

    async fn assigned_item_ids(
        &self,
        event_id: &str,
        location_id: &str,
        item_ids: &[String],
    ) -> StoreResult<HashSet<String>> {
        Ok(self
            .tables
            .lock()
            .location_items
            .iter()
            .filter(|li| {
                li.event_id == event_id
                    && li.location_id == location_id
                    && li.active
                    && item_ids.contains(&li.item_id)
            })
            .map(|li| li.item_id.clone())
            .collect())
    }

    async fn list_location_items(
        &self,
        event_id: &str,
        location_id: &str,
    ) -> StoreResult<Vec<Item>> {
        let t = self.tables.lock();
        let mut assigned: Vec<(i32, Item)> = t
            .location_items
            .iter()
            .filter(|li| li.event_id == event_id && li.location_id == location_id && li.active)
            .filter_map(|li| {
                t.items
                    .iter()
                    .find(|i| i.id == li.item_id)
                    .map(|i| (li.sort, i.clone()))
            })
            .collect();
        assigned.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        Ok(assigned.into_iter().map(|(_, item)| item).collect())
    }

    async fn find_runner(&self, id: &str) -> StoreResult<Option<Runner>> {
        Ok(self.tables.lock().runners.iter().find(|r| r.id == id).cloned())
    }

    async fn list_active_runners(&self, event_id: &str) -> StoreResult<Vec<Runner>> {
        let mut runners: Vec<Runner> = self
            .tables
            .lock()
            .runners
            .iter()
            .filter(|r| r.event_id == event_id && r.active)
            .cloned()
            .collect();
        runners.sort_by_key(|r| r.created_at);
        Ok(runners)
    }

    async fn set_runner_pin(&self, id: &str, pin_hash: &str) -> StoreResult<bool> {
        let mut t = self.tables.lock();
        match t.runners.iter_mut().find(|r| r.id == id) {
            Some(runner) => {
                runner.pin_hash = Some(pin_hash.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        self.tables.lock().orders.push(order.clone());
        Ok(())
    }

    async fn insert_order_lines(&self, lines: &[OrderLine]) -> StoreResult<()> {
        if self.fail_line_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("order line insert disabled".into()));
        }
        self.tables.lock().lines.extend_from_slice(lines);
        Ok(())
    }

    async fn delete_order(&self, id: &str) -> StoreResult<()> {
        if self.fail_order_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("order delete disabled".into()));
        }
        let mut t = self.tables.lock();
        t.orders.retain(|o| o.id != id);
        t.lines.retain(|l| l.order_id != id);
        Ok(())
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        order_id: &str,
        event_id: &str,
        allowed_from: &[OrderStatus],
        next: OrderStatus,
        delivered_at: Option<i64>,
    ) -> StoreResult<Option<Order>> {
        let mut t = self.tables.lock();
        let Some(order) = t.orders.iter_mut().find(|o| {
            o.id == order_id
                && o.event_id == event_id
                && o.archived_at.is_none()
                && allowed_from.contains(&o.status)
        }) else {
            return Ok(None);
        };
        order.status = next;
        order.delivered_at = delivered_at;
        Ok(Some(order.clone()))
    }

    async fn compare_and_archive(
        &self,
        order_id: &str,
        event_id: &str,
        archived_at: i64,
    ) -> StoreResult<Option<Order>> {
        let mut t = self.tables.lock();
        let Some(order) = t.orders.iter_mut().find(|o| {
            o.id == order_id
                && o.event_id == event_id
                && o.status == OrderStatus::Delivered
                && o.archived_at.is_none()
        }) else {
            return Ok(None);
        };
        order.archived_at = Some(archived_at);
        Ok(Some(order.clone()))
    }

    async fn list_open_orders(&self, event_id: &str) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .tables
            .lock()
            .orders
            .iter()
            .filter(|o| o.event_id == event_id && o.archived_at.is_none())
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn list_location_orders(
        &self,
        event_id: &str,
        location_id: &str,
        include_archived: bool,
        limit: Option<i64>,
    ) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .tables
            .lock()
            .orders
            .iter()
            .filter(|o| {
                o.event_id == event_id
                    && o.location_id == location_id
                    && (include_archived || o.archived_at.is_none())
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            orders.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(orders)
    }

    async fn list_order_lines(&self, order_ids: &[String]) -> StoreResult<Vec<OrderLineDetail>> {
        let t = self.tables.lock();
        Ok(t.lines
            .iter()
            .filter(|l| order_ids.contains(&l.order_id))
            .map(|l| OrderLineDetail {
                order_id: l.order_id.clone(),
                item_id: l.item_id.clone(),
                qty: l.qty,
                unit: l.unit,
                item_name: t
                    .items
                    .iter()
                    .find(|i| i.id == l.item_id)
                    .map(|i| i.name.clone()),
            })
            .collect())
    }
}
