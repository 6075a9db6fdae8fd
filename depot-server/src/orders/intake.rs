//! Order intake
//!
//! A location may only order items assigned and active for it in the
//! active event. The membership check is one batch lookup and any miss
//! rejects the whole order before anything is written.

use serde::Deserialize;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderLine, OrderStatus, Priority, Unit};
use shared::util::{new_id, now_millis};

use crate::db::Store;
use crate::error::ServiceResult;
use crate::tenant::TenantContext;

/// Order as submitted by a location client.
///
/// Every field is kept as raw JSON so a wrongly typed value costs only its
/// own line (or falls back to the default) instead of the whole body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default)]
    pub priority: Option<Value>,
    #[serde(default)]
    pub note: Option<Value>,
    #[serde(default)]
    pub lines: Value,
}

impl OrderDraft {
    /// Lines that parse. A non-array `lines` and non-object entries yield none.
    pub fn valid_lines(&self) -> Vec<ValidLine> {
        let Some(entries) = self.lines.as_array() else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|entry| entry.is_object())
            .filter_map(|entry| LineDraft::deserialize(entry).ok())
            .filter_map(|line| line.parse())
            .collect()
    }

    /// `urgent` or `normal`; anything else is `normal`
    pub fn priority(&self) -> Priority {
        Priority::parse_lenient(self.priority.as_ref().and_then(Value::as_str))
    }

    /// Trimmed note; blank or non-string is none
    pub fn note(&self) -> Option<String> {
        self.note
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

/// One submitted line; fields stay loose until [`LineDraft::parse`]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDraft {
    /// String, or a number taken by its decimal text
    #[serde(default)]
    pub item_id: Option<Value>,
    /// JSON number or numeric string
    #[serde(default)]
    pub qty: Option<Value>,
    #[serde(default)]
    pub unit: Option<Value>,
}

/// A line that passed shape validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidLine {
    pub item_id: String,
    pub qty: f64,
    pub unit: Unit,
}

impl LineDraft {
    /// `None` if the line is unusable: empty item id, quantity not a
    /// positive finite number, or an unknown unit
    pub fn parse(&self) -> Option<ValidLine> {
        let item_id = match self.item_id.as_ref()? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if item_id.is_empty() {
            return None;
        }
        let qty = match self.qty.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if !qty.is_finite() || qty <= 0.0 {
            return None;
        }
        let unit = Unit::from_db(self.unit.as_ref()?.as_str()?.trim())?;
        Some(ValidLine { item_id, qty, unit })
    }
}

/// Create an order for `location_id` in the active event.
///
/// Inserts the order, then its lines. If the line insert fails the order
/// row is deleted again; the line error is returned either way.
pub async fn create_order(
    store: &dyn Store,
    ctx: &TenantContext,
    location_id: &str,
    draft: OrderDraft,
) -> ServiceResult<Order> {
    let lines = draft.valid_lines();
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).into());
    }

    let location = store
        .find_location(location_id)
        .await?
        .filter(|l| l.event_id == ctx.event_id && l.active)
        .ok_or_else(|| {
            AppError::new(ErrorCode::LocationNotFound).with_detail("locationId", location_id)
        })?;

    let mut item_ids: Vec<String> = lines.iter().map(|l| l.item_id.clone()).collect();
    item_ids.sort();
    item_ids.dedup();

    let assigned = store
        .assigned_item_ids(&ctx.event_id, &location.id, &item_ids)
        .await?;
    let rejected: Vec<&String> = item_ids.iter().filter(|id| !assigned.contains(*id)).collect();
    if !rejected.is_empty() {
        tracing::debug!(location_id = %location.id, ?rejected, "Order references unassigned items");
        return Err(AppError::new(ErrorCode::ItemNotAssigned)
            .with_detail("itemIds", rejected.into_iter().cloned().collect::<Vec<_>>())
            .into());
    }

    let order = Order {
        id: new_id(),
        event_id: ctx.event_id.clone(),
        location_id: location.id.clone(),
        status: OrderStatus::New,
        priority: draft.priority(),
        note: draft.note(),
        created_at: now_millis(),
        delivered_at: None,
        archived_at: None,
    };
    store.insert_order(&order).await?;

    let rows: Vec<OrderLine> = lines
        .into_iter()
        .map(|l| OrderLine {
            order_id: order.id.clone(),
            item_id: l.item_id,
            qty: l.qty,
            unit: l.unit,
        })
        .collect();

    if let Err(e) = store.insert_order_lines(&rows).await {
        compensate(store, &order.id).await;
        return Err(e.into());
    }

    tracing::info!(
        order_id = %order.id,
        location_id = %order.location_id,
        priority = order.priority.as_db(),
        lines = rows.len(),
        "Order created"
    );
    Ok(order)
}

/// Roll back an order whose lines could not be written. Its own failure is
/// logged and otherwise swallowed.
async fn compensate(store: &dyn Store, order_id: &str) {
    match store.delete_order(order_id).await {
        Ok(()) => tracing::warn!(order_id, "Order rolled back after line insert failure"),
        Err(e) => tracing::error!(order_id, error = %e, "Failed to roll back order"),
    }
}
