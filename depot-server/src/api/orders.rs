//! Order API handlers
//!
//! POST /api/orders               - a location places an order
//! POST /api/orders/{id}/status   - a runner moves an order along
//! POST /api/orders/{id}/archive  - a runner archives a delivered order

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::OrderStatus;

use super::json::AppJson;
use crate::auth::{Authenticated, LocationClaims, RunnerClaims};
use crate::orders::{self, OrderDraft};
use crate::state::AppState;
use crate::tenant::ActiveEvent;

#[derive(Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBody {
    pub order_id: String,
}

#[derive(Serialize)]
pub struct StatusBody {
    pub status: OrderStatus,
}

pub async fn create(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated<LocationClaims>,
    ActiveEvent(ctx): ActiveEvent,
    AppJson(draft): AppJson<OrderDraft>,
) -> AppResult<ApiResponse<CreatedBody>> {
    let order = orders::create_order(state.store.as_ref(), &ctx, &claims.loc, draft).await?;
    Ok(ApiResponse::success(CreatedBody { order_id: order.id }))
}

pub async fn update_status(
    State(state): State<AppState>,
    _runner: Authenticated<RunnerClaims>,
    ActiveEvent(ctx): ActiveEvent,
    Path(id): Path<String>,
    AppJson(req): AppJson<StatusRequest>,
) -> AppResult<ApiResponse<StatusBody>> {
    let requested = req.status.as_deref().map(str::trim).unwrap_or_default();
    let next = OrderStatus::from_db(requested).ok_or_else(|| {
        AppError::new(ErrorCode::InvalidOrderStatus).with_detail("status", requested)
    })?;

    let order = orders::transition(state.store.as_ref(), &ctx, &id, next).await?;
    Ok(ApiResponse::success(StatusBody {
        status: order.status,
    }))
}

pub async fn archive(
    State(state): State<AppState>,
    _runner: Authenticated<RunnerClaims>,
    ActiveEvent(ctx): ActiveEvent,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    orders::archive(state.store.as_ref(), &ctx, &id).await?;
    Ok(ApiResponse::ok())
}
