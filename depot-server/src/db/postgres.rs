//! PostgreSQL-backed store

use std::collections::HashSet;

use async_trait::async_trait;
use shared::models::{
    Event, EventStatus, Item, Location, LocationType, Order, OrderLine, OrderStatus, Priority,
    Runner, Unit,
};
use sqlx::PgPool;

use super::{OrderLineDetail, Store, StoreError, StoreResult};

const ORDER_COLUMNS: &str = "id, event_id, location_id, status, priority, note, \
                             created_at, delivered_at, archived_at";

const LOCATION_COLUMNS: &str = "id, public_id, name, type AS location_type, active, pin_hash, event_id";

#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    name: String,
    status: String,
    created_at: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = EventStatus::from_db(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("event {}: status {}", row.id, row.status)))?;
        Ok(Event {
            id: row.id,
            name: row.name,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: String,
    public_id: String,
    name: String,
    location_type: String,
    active: bool,
    pin_hash: Option<String>,
    event_id: String,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            public_id: row.public_id,
            name: row.name,
            location_type: LocationType::normalize(&row.location_type),
            active: row.active,
            pin_hash: row.pin_hash,
            event_id: row.event_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    name: String,
    category: String,
    subcategory: Option<String>,
    default_unit: String,
    pack_size: Option<i32>,
    active: bool,
}

impl TryFrom<ItemRow> for Item {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let default_unit = Unit::from_db(&row.default_unit).ok_or_else(|| {
            StoreError::Corrupt(format!("item {}: unit {}", row.id, row.default_unit))
        })?;
        Ok(Item {
            id: row.id,
            name: row.name,
            category: row.category,
            subcategory: row.subcategory,
            default_unit,
            pack_size: row.pack_size,
            active: row.active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RunnerRow {
    id: String,
    name: String,
    pin_hash: Option<String>,
    active: bool,
    event_id: String,
    created_at: i64,
}

impl From<RunnerRow> for Runner {
    fn from(row: RunnerRow) -> Self {
        Runner {
            id: row.id,
            name: row.name,
            pin_hash: row.pin_hash,
            active: row.active,
            event_id: row.event_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    event_id: String,
    location_id: String,
    status: String,
    priority: String,
    note: Option<String>,
    created_at: i64,
    delivered_at: Option<i64>,
    archived_at: Option<i64>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_db(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("order {}: status {}", row.id, row.status)))?;
        let priority = Priority::from_db(&row.priority).ok_or_else(|| {
            StoreError::Corrupt(format!("order {}: priority {}", row.id, row.priority))
        })?;
        Ok(Order {
            id: row.id,
            event_id: row.event_id,
            location_id: row.location_id,
            status,
            priority,
            note: row.note,
            created_at: row.created_at,
            delivered_at: row.delivered_at,
            archived_at: row.archived_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    order_id: String,
    item_id: String,
    qty: f64,
    unit: String,
    item_name: Option<String>,
}

impl TryFrom<LineRow> for OrderLineDetail {
    type Error = StoreError;

    fn try_from(row: LineRow) -> Result<Self, Self::Error> {
        let unit = Unit::from_db(&row.unit).ok_or_else(|| {
            StoreError::Corrupt(format!("order line {}: unit {}", row.order_id, row.unit))
        })?;
        Ok(OrderLineDetail {
            order_id: row.order_id,
            item_id: row.item_id,
            qty: row.qty,
            unit,
            item_name: row.item_name,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run embedded migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn active_event_id(&self) -> StoreResult<Option<String>> {
        let id: Option<Option<String>> =
            sqlx::query_scalar("SELECT active_event_id FROM app_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(id.flatten())
    }

    async fn set_active_event_id(&self, event_id: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO app_settings (id, active_event_id) VALUES (1, $1)
             ON CONFLICT (id) DO UPDATE SET active_event_id = EXCLUDED.active_event_id",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>> {
        let row: Option<EventRow> =
            sqlx::query_as("SELECT id, name, status, created_at FROM events WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Event::try_from).transpose()
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT id, name, status, created_at FROM events ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn archive_event(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE events SET status = 'archived' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_location(&self, id: &str) -> StoreResult<Option<Location>> {
        let row: Option<LocationRow> =
            sqlx::query_as(&format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Location::from))
    }

    async fn find_location_by_public_id(
        &self,
        event_id: &str,
        public_id: &str,
    ) -> StoreResult<Option<Location>> {
        let row: Option<LocationRow> = sqlx::query_as(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE event_id = $1 AND public_id = $2"
        ))
        .bind(event_id)
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Location::from))
    }

    async fn list_locations(&self, event_id: &str, ids: &[String]) -> StoreResult<Vec<Location>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<LocationRow> = sqlx::query_as(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE event_id = $1 AND id = ANY($2)"
        ))
        .bind(event_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn set_location_pin(&self, id: &str, pin_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE locations SET pin_hash = $1 WHERE id = $2")
            .bind(pin_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_locations(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn assigned_item_ids(
        &self,
        event_id: &str,
        location_id: &str,
        item_ids: &[String],
    ) -> StoreResult<HashSet<String>> {
        if item_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT item_id FROM location_items
             WHERE event_id = $1 AND location_id = $2 AND active = TRUE AND item_id = ANY($3)",
        )
        .bind(event_id)
        .bind(location_id)
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn list_location_items(
        &self,
        event_id: &str,
        location_id: &str,
    ) -> StoreResult<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT i.id, i.name, i.category, i.subcategory, i.default_unit, i.pack_size, i.active
             FROM location_items li
             JOIN items i ON i.id = li.item_id
             WHERE li.event_id = $1 AND li.location_id = $2 AND li.active = TRUE
             ORDER BY li.sort ASC, i.name ASC",
        )
        .bind(event_id)
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn find_runner(&self, id: &str) -> StoreResult<Option<Runner>> {
        let row: Option<RunnerRow> = sqlx::query_as(
            "SELECT id, name, pin_hash, active, event_id, created_at FROM runners WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Runner::from))
    }

    async fn list_active_runners(&self, event_id: &str) -> StoreResult<Vec<Runner>> {
        let rows: Vec<RunnerRow> = sqlx::query_as(
            "SELECT id, name, pin_hash, active, event_id, created_at FROM runners
             WHERE event_id = $1 AND active = TRUE
             ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Runner::from).collect())
    }

    async fn set_runner_pin(&self, id: &str, pin_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE runners SET pin_hash = $1 WHERE id = $2")
            .bind(pin_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO orders (id, event_id, location_id, status, priority, note, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&order.id)
        .bind(&order.event_id)
        .bind(&order.location_id)
        .bind(order.status.as_db())
        .bind(order.priority.as_db())
        .bind(&order.note)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_order_lines(&self, lines: &[OrderLine]) -> StoreResult<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let order_ids: Vec<&str> = lines.iter().map(|l| l.order_id.as_str()).collect();
        let item_ids: Vec<&str> = lines.iter().map(|l| l.item_id.as_str()).collect();
        let qtys: Vec<f64> = lines.iter().map(|l| l.qty).collect();
        let units: Vec<&str> = lines.iter().map(|l| l.unit.as_db()).collect();

        // One statement: either every line lands or none does
        sqlx::query(
            "INSERT INTO order_lines (order_id, item_id, qty, unit)
             SELECT * FROM UNNEST($1::text[], $2::text[], $3::float8[], $4::text[])",
        )
        .bind(order_ids)
        .bind(item_ids)
        .bind(qtys)
        .bind(units)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_order(&self, id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Order::try_from).transpose()
    }

    async fn compare_and_set_status(
        &self,
        order_id: &str,
        event_id: &str,
        allowed_from: &[OrderStatus],
        next: OrderStatus,
        delivered_at: Option<i64>,
    ) -> StoreResult<Option<Order>> {
        let allowed: Vec<&str> = allowed_from.iter().map(|s| s.as_db()).collect();
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET status = $1, delivered_at = $2
             WHERE id = $3 AND event_id = $4 AND archived_at IS NULL AND status = ANY($5)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(next.as_db())
        .bind(delivered_at)
        .bind(order_id)
        .bind(event_id)
        .bind(allowed)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn compare_and_archive(
        &self,
        order_id: &str,
        event_id: &str,
        archived_at: i64,
    ) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET archived_at = $1
             WHERE id = $2 AND event_id = $3 AND status = 'delivered' AND archived_at IS NULL
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(archived_at)
        .bind(order_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_open_orders(&self, event_id: &str) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE event_id = $1 AND archived_at IS NULL
             ORDER BY created_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_location_orders(
        &self,
        event_id: &str,
        location_id: &str,
        include_archived: bool,
        limit: Option<i64>,
    ) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE event_id = $1 AND location_id = $2 AND ($3 OR archived_at IS NULL)
             ORDER BY created_at DESC
             LIMIT $4"
        ))
        .bind(event_id)
        .bind(location_id)
        .bind(include_archived)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_order_lines(&self, order_ids: &[String]) -> StoreResult<Vec<OrderLineDetail>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<LineRow> = sqlx::query_as(
            "SELECT l.order_id, l.item_id, l.qty, l.unit, i.name AS item_name
             FROM order_lines l
             LEFT JOIN items i ON i.id = l.item_id
             WHERE l.order_id = ANY($1)",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}
