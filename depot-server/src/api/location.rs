//! Location API handlers
//!
//! POST /api/location/unlock   - publicId + PIN → location session cookie
//! POST /api/location/logout   - clear the cookie
//! GET  /api/location/session  - re-validate (optionally against ?publicId=)
//! GET  /api/location/items    - items this location may order
//! GET  /api/location/orders   - open orders, or ?history=true for the last 20

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::Item;

use super::json::{AppJson, AppQuery};
use crate::auth::pin::{self, PinPolicy};
use crate::auth::{Authenticated, LocationClaims, SessionKind, location_session};
use crate::error::ServiceError;
use crate::orders::{self, queue::LocationOrderEntry};
use crate::state::AppState;
use crate::tenant::ActiveEvent;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    #[serde(default)]
    pub public_id: String,
    #[serde(default)]
    pub pin: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockBody {
    pub location_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub public_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    pub public_id: String,
    pub location_id: String,
}

#[derive(Serialize)]
pub struct ItemsBody {
    pub items: Vec<Item>,
}

#[derive(Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub history: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersBody {
    pub orders: Vec<LocationOrderEntry>,
    pub location_id: String,
}

pub async fn unlock(
    State(state): State<AppState>,
    ActiveEvent(ctx): ActiveEvent,
    AppJson(req): AppJson<UnlockRequest>,
) -> AppResult<Response> {
    let public_id = req.public_id.trim();
    if public_id.is_empty() {
        return Err(AppError::required_field("publicId"));
    }
    let pin = PinPolicy::Unlock.validate(&req.pin)?;

    let location = state
        .store
        .find_location_by_public_id(&ctx.event_id, public_id)
        .await
        .map_err(ServiceError::from)?
        .filter(|l| l.active)
        .ok_or_else(|| AppError::new(ErrorCode::LocationNotFound).with_detail("publicId", public_id))?;

    let verified = match location.pin_hash.clone() {
        Some(hash) => pin::verify_pin_blocking(pin.to_string(), hash).await,
        None => false,
    };
    if !verified {
        tracing::warn!(kind = "location", location_id = %location.id, "Unlock failed: wrong PIN");
        return Err(AppError::invalid_credentials());
    }

    let token = state.sessions.issue(LocationClaims {
        loc: location.id.clone(),
        pid: location.public_id.clone(),
    })?;
    tracing::info!(location_id = %location.id, "Location unlocked");
    Ok(super::with_session(
        &state,
        SessionKind::Location,
        &token,
        ApiResponse::success(UnlockBody {
            location_name: location.name,
        }),
    ))
}

pub async fn logout(State(state): State<AppState>) -> Response {
    super::logout(&state, SessionKind::Location)
}

pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppQuery(query): AppQuery<SessionQuery>,
) -> AppResult<ApiResponse<SessionBody>> {
    let expected = query
        .public_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let claims = location_session(&state, &headers, expected)?;
    Ok(ApiResponse::success(SessionBody {
        public_id: claims.pid,
        location_id: claims.loc,
    }))
}

pub async fn items(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated<LocationClaims>,
    ActiveEvent(ctx): ActiveEvent,
) -> AppResult<ApiResponse<ItemsBody>> {
    let in_event = state
        .store
        .find_location(&claims.loc)
        .await
        .map_err(ServiceError::from)?
        .is_some_and(|l| l.event_id == ctx.event_id);
    if !in_event {
        return Err(AppError::new(ErrorCode::LocationNotFound).with_detail("locationId", claims.loc));
    }

    let items = state
        .store
        .list_location_items(&ctx.event_id, &claims.loc)
        .await
        .map_err(ServiceError::from)?;
    Ok(ApiResponse::success(ItemsBody { items }))
}

pub async fn orders(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated<LocationClaims>,
    ActiveEvent(ctx): ActiveEvent,
    AppQuery(query): AppQuery<OrdersQuery>,
) -> AppResult<ApiResponse<OrdersBody>> {
    let orders =
        orders::location_orders(state.store.as_ref(), &ctx, &claims.loc, query.history).await?;
    Ok(ApiResponse::success(OrdersBody {
        orders,
        location_id: claims.loc,
    }))
}
