//! Datastore access layer
//!
//! [`Store`] is the only seam between the order engine and persistence.
//! Every conditional write is a single atomic operation in each backend:
//! one SQL statement in [`PgStore`], one lock acquisition in [`MemoryStore`].

pub mod memory;
pub mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;
use shared::models::{Event, Item, Location, Order, OrderLine, OrderStatus, Runner, Unit};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Datastore error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row holds a value outside its column's domain
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for datastore operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Order line joined with its item name, as shown in queue views
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineDetail {
    pub order_id: String,
    pub item_id: String,
    pub qty: f64,
    pub unit: Unit,
    pub item_name: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Settings ====================

    /// The active event pointer (settings row id = 1)
    async fn active_event_id(&self) -> StoreResult<Option<String>>;

    /// Unconditional overwrite of the active event pointer
    async fn set_active_event_id(&self, event_id: &str) -> StoreResult<()>;

    // ==================== Events ====================

    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>>;

    /// All events, newest first
    async fn list_events(&self) -> StoreResult<Vec<Event>>;

    /// Mark an event archived. Returns false when no such event exists.
    async fn archive_event(&self, id: &str) -> StoreResult<bool>;

    // ==================== Locations ====================

    async fn find_location(&self, id: &str) -> StoreResult<Option<Location>>;

    async fn find_location_by_public_id(
        &self,
        event_id: &str,
        public_id: &str,
    ) -> StoreResult<Option<Location>>;

    /// Locations of `event_id` among `ids`
    async fn list_locations(&self, event_id: &str, ids: &[String]) -> StoreResult<Vec<Location>>;

    /// Returns false when no such location exists
    async fn set_location_pin(&self, id: &str, pin_hash: &str) -> StoreResult<bool>;

    async fn count_locations(&self) -> StoreResult<i64>;

    // ==================== Assignments ====================

    /// Subset of `item_ids` assigned and active for the location in the event.
    /// One batch lookup regardless of how many ids are passed.
    async fn assigned_item_ids(
        &self,
        event_id: &str,
        location_id: &str,
        item_ids: &[String],
    ) -> StoreResult<HashSet<String>>;

    /// Items assigned and active for the location, in assignment sort order
    async fn list_location_items(&self, event_id: &str, location_id: &str)
    -> StoreResult<Vec<Item>>;

    // ==================== Runners ====================

    async fn find_runner(&self, id: &str) -> StoreResult<Option<Runner>>;

    /// Active runners of an event in creation order
    async fn list_active_runners(&self, event_id: &str) -> StoreResult<Vec<Runner>>;

    /// Returns false when no such runner exists
    async fn set_runner_pin(&self, id: &str, pin_hash: &str) -> StoreResult<bool>;

    // ==================== Orders ====================

    async fn insert_order(&self, order: &Order) -> StoreResult<()>;

    async fn insert_order_lines(&self, lines: &[OrderLine]) -> StoreResult<()>;

    /// Remove an order and its lines (compensation for a failed intake)
    async fn delete_order(&self, id: &str) -> StoreResult<()>;

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>>;

    /// Set `status = next` and `delivered_at` only if the order belongs to
    /// `event_id`, is not archived and its status is one of `allowed_from`.
    /// Returns the updated order, or `None` if the predicate did not hold.
    async fn compare_and_set_status(
        &self,
        order_id: &str,
        event_id: &str,
        allowed_from: &[OrderStatus],
        next: OrderStatus,
        delivered_at: Option<i64>,
    ) -> StoreResult<Option<Order>>;

    /// Set `archived_at` only if the order belongs to `event_id`, is
    /// delivered and not yet archived.
    async fn compare_and_archive(
        &self,
        order_id: &str,
        event_id: &str,
        archived_at: i64,
    ) -> StoreResult<Option<Order>>;

    /// Non-archived orders of an event, oldest first
    async fn list_open_orders(&self, event_id: &str) -> StoreResult<Vec<Order>>;

    /// Orders of one location, newest first. Archived orders are included
    /// only when `include_archived` is set.
    async fn list_location_orders(
        &self,
        event_id: &str,
        location_id: &str,
        include_archived: bool,
        limit: Option<i64>,
    ) -> StoreResult<Vec<Order>>;

    /// Lines (with item names) of a batch of orders
    async fn list_order_lines(&self, order_ids: &[String]) -> StoreResult<Vec<OrderLineDetail>>;
}
