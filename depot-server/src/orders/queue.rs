//! Queue views polled by runner and location clients

use std::collections::HashMap;

use serde::Serialize;
use shared::models::{LocationType, Order, OrderStatus, Priority, Unit};

use crate::db::{OrderLineDetail, Store};
use crate::error::ServiceResult;
use crate::tenant::TenantContext;

/// Orders shown in a location's history view
pub const HISTORY_LIMIT: i64 = 20;

/// Shown when an order references a location or item that no longer resolves
const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueLine {
    pub qty: f64,
    pub unit: Unit,
    pub item_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
}

/// One order in the runner queue
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerQueueEntry {
    pub id: String,
    pub status: OrderStatus,
    pub priority: Priority,
    pub note: Option<String>,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
    pub location: LocationSummary,
    pub lines: Vec<QueueLine>,
}

/// One order as seen by the location that placed it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOrderEntry {
    pub id: String,
    pub status: OrderStatus,
    pub priority: Priority,
    pub note: Option<String>,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
    pub archived_at: Option<i64>,
    pub lines: Vec<QueueLine>,
}

/// Urgent before normal, then oldest first. Ties fall back to the id so the
/// order is total.
pub fn sort_queue(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        let urgent = |o: &Order| o.priority == Priority::Urgent;
        urgent(b)
            .cmp(&urgent(a))
            .then(a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// The active queue: every open order of the event with its location and lines
pub async fn runner_queue(
    store: &dyn Store,
    ctx: &TenantContext,
) -> ServiceResult<Vec<RunnerQueueEntry>> {
    let mut orders = store.list_open_orders(&ctx.event_id).await?;
    sort_queue(&mut orders);

    let mut location_ids: Vec<String> = orders.iter().map(|o| o.location_id.clone()).collect();
    location_ids.sort();
    location_ids.dedup();
    let locations: HashMap<String, LocationSummary> = store
        .list_locations(&ctx.event_id, &location_ids)
        .await?
        .into_iter()
        .map(|l| {
            (
                l.id,
                LocationSummary {
                    name: l.name,
                    location_type: l.location_type,
                },
            )
        })
        .collect();

    let mut lines = lines_by_order(store, &orders).await?;

    Ok(orders
        .into_iter()
        .map(|o| RunnerQueueEntry {
            location: locations.get(&o.location_id).cloned().unwrap_or_else(|| {
                LocationSummary {
                    name: UNKNOWN.to_string(),
                    location_type: LocationType::Bar,
                }
            }),
            lines: lines.remove(&o.id).unwrap_or_default(),
            id: o.id,
            status: o.status,
            priority: o.priority,
            note: o.note,
            created_at: o.created_at,
            delivered_at: o.delivered_at,
        })
        .collect())
}

/// A location's own orders in the active event.
///
/// Without `history`: open orders in queue order. With `history`: the
/// [`HISTORY_LIMIT`] most recent orders, archived included, newest first.
pub async fn location_orders(
    store: &dyn Store,
    ctx: &TenantContext,
    location_id: &str,
    history: bool,
) -> ServiceResult<Vec<LocationOrderEntry>> {
    let orders = if history {
        store
            .list_location_orders(&ctx.event_id, location_id, true, Some(HISTORY_LIMIT))
            .await?
    } else {
        let mut open = store
            .list_location_orders(&ctx.event_id, location_id, false, None)
            .await?;
        sort_queue(&mut open);
        open
    };

    let mut lines = lines_by_order(store, &orders).await?;

    Ok(orders
        .into_iter()
        .map(|o| LocationOrderEntry {
            lines: lines.remove(&o.id).unwrap_or_default(),
            id: o.id,
            status: o.status,
            priority: o.priority,
            note: o.note,
            created_at: o.created_at,
            delivered_at: o.delivered_at,
            archived_at: o.archived_at,
        })
        .collect())
}

async fn lines_by_order(
    store: &dyn Store,
    orders: &[Order],
) -> ServiceResult<HashMap<String, Vec<QueueLine>>> {
    if orders.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let mut grouped: HashMap<String, Vec<QueueLine>> = HashMap::new();
    for OrderLineDetail {
        order_id,
        qty,
        unit,
        item_name,
        ..
    } in store.list_order_lines(&ids).await?
    {
        grouped.entry(order_id).or_default().push(QueueLine {
            qty,
            unit,
            item_name: item_name.unwrap_or_else(|| UNKNOWN.to_string()),
        });
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::orders::lifecycle;
    use crate::testing::{self, BAR, BEER, ctx, seeded_store};
    use shared::models::OrderLine;

    fn ids(orders: &[Order]) -> Vec<&str> {
        orders.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_sort_queue_urgent_first_then_fifo() {
        let mut orders = vec![
            testing::order("a", OrderStatus::New, Priority::Normal, 10),
            testing::order("b", OrderStatus::New, Priority::Urgent, 30),
            testing::order("c", OrderStatus::New, Priority::Normal, 5),
            testing::order("d", OrderStatus::New, Priority::Urgent, 20),
            testing::order("e", OrderStatus::New, Priority::Normal, 10),
        ];
        sort_queue(&mut orders);
        assert_eq!(ids(&orders), ["d", "b", "c", "a", "e"]);
    }

    async fn place(store: &MemoryStore, order: Order) {
        store.insert_order(&order).await.unwrap();
        store
            .insert_order_lines(&[OrderLine {
                order_id: order.id.clone(),
                item_id: BEER.into(),
                qty: 2.0,
                unit: Unit::Case,
            }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_runner_queue_shape() {
        let store = seeded_store();
        place(&store, testing::order("o1", OrderStatus::New, Priority::Normal, 10)).await;
        place(&store, testing::order("o2", OrderStatus::New, Priority::Urgent, 20)).await;
        let mut orphan = testing::order("o3", OrderStatus::New, Priority::Normal, 30);
        orphan.location_id = "gone".into();
        place(&store, orphan).await;

        let queue = runner_queue(&store, &ctx()).await.unwrap();
        let ids: Vec<&str> = queue.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["o2", "o1", "o3"]);

        assert_eq!(queue[0].location.name, format!("Stand {BAR}"));
        assert_eq!(queue[0].lines[0].item_name, "Beer");
        assert_eq!(
            queue[2].location,
            LocationSummary {
                name: "unknown".into(),
                location_type: LocationType::Bar
            }
        );

        let json = serde_json::to_value(&queue[0]).unwrap();
        assert_eq!(json["location"]["type"], "bar");
        assert_eq!(json["lines"][0], serde_json::json!({"qty": 2.0, "unit": "case", "itemName": "Beer"}));
        assert_eq!(json["createdAt"], 20);
    }

    #[tokio::test]
    async fn test_archived_orders_leave_the_queue() {
        let store = seeded_store();
        place(&store, testing::order("o1", OrderStatus::Delivered, Priority::Normal, 10)).await;
        place(&store, testing::order("o2", OrderStatus::New, Priority::Normal, 20)).await;
        lifecycle::archive(&store, &ctx(), "o1").await.unwrap();

        let queue = runner_queue(&store, &ctx()).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, "o2");

        let open = location_orders(&store, &ctx(), BAR, false).await.unwrap();
        assert_eq!(open.len(), 1);

        let history = location_orders(&store, &ctx(), BAR, true).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, "o2");
        assert!(history[1].archived_at.is_some());
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let store = seeded_store();
        for i in 0..25 {
            place(&store, testing::order(&format!("o{i}"), OrderStatus::New, Priority::Normal, i)).await;
        }
        let history = location_orders(&store, &ctx(), BAR, true).await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT as usize);
        assert_eq!(history[0].id, "o24");
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let store = seeded_store();
        assert!(runner_queue(&store, &ctx()).await.unwrap().is_empty());
        assert!(location_orders(&store, &ctx(), BAR, true).await.unwrap().is_empty());
    }
}
