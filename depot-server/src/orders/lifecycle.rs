//! Order status transitions and archival
//!
//! Both operations are a single conditional write in the store. A miss is
//! reported as a 409 conflict: the order was not in a state the requested
//! change may follow, usually because another runner got there first.

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderStatus};
use shared::util::now_millis;

use crate::db::Store;
use crate::error::ServiceResult;
use crate::tenant::TenantContext;

/// Move an order to `next` if its current status is one `next` may follow
pub async fn transition(
    store: &dyn Store,
    ctx: &TenantContext,
    order_id: &str,
    next: OrderStatus,
) -> ServiceResult<Order> {
    let delivered_at = (next == OrderStatus::Delivered).then(now_millis);

    let updated = store
        .compare_and_set_status(
            order_id,
            &ctx.event_id,
            next.allowed_predecessors(),
            next,
            delivered_at,
        )
        .await?;

    match updated {
        Some(order) => {
            tracing::info!(order_id = %order.id, status = %order.status, "Order status changed");
            Ok(order)
        }
        None => {
            tracing::debug!(order_id, requested = %next, "Order transition rejected");
            Err(AppError::new(ErrorCode::OrderTransitionRejected)
                .with_detail("orderId", order_id)
                .into())
        }
    }
}

/// Stamp `archived_at` on a delivered, not yet archived order
pub async fn archive(store: &dyn Store, ctx: &TenantContext, order_id: &str) -> ServiceResult<Order> {
    match store
        .compare_and_archive(order_id, &ctx.event_id, now_millis())
        .await?
    {
        Some(order) => {
            tracing::info!(order_id = %order.id, "Order archived");
            Ok(order)
        }
        None => {
            tracing::debug!(order_id, "Order archive rejected");
            Err(AppError::new(ErrorCode::OrderNotArchivable)
                .with_detail("orderId", order_id)
                .into())
        }
    }
}
