//! Admin API handlers
//!
//! POST  /api/admin/unlock               - admin PIN → admin session cookie
//! POST  /api/admin/logout               - clear the cookie
//! GET   /api/admin/session              - re-validate the session
//! GET   /api/admin/settings             - active event id + all events
//! PATCH /api/admin/settings             - switch the active event
//! POST  /api/admin/events/{id}/archive  - archive an event
//! POST  /api/admin/locations/{id}/pin   - set a location PIN
//! POST  /api/admin/runners/{id}/pin     - set a runner PIN

use axum::extract::{Path, State};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::Event;

use super::json::AppJson;
use crate::auth::pin::{self, PinPolicy};
use crate::auth::{AdminClaims, Authenticated, SessionKind};
use crate::error::ServiceError;
use crate::state::AppState;
use crate::tenant::{self, ActiveEvent};

#[derive(Deserialize)]
pub struct PinRequest {
    #[serde(default)]
    pub pin: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub active_event_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBody {
    pub active_event_id: Option<String>,
    pub events: Vec<Event>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEventBody {
    pub active_event_id: String,
}

pub async fn unlock(
    State(state): State<AppState>,
    AppJson(req): AppJson<PinRequest>,
) -> AppResult<Response> {
    let Some(expected) = state.admin_access_pin.as_deref() else {
        return Err(AppError::config("ADMIN_ACCESS_PIN is not set"));
    };

    if !pin::matches_configured(req.pin.trim(), expected) {
        tracing::warn!(kind = "admin", "Unlock failed: wrong PIN");
        return Err(AppError::invalid_credentials());
    }

    let token = state.sessions.issue(AdminClaims {})?;
    tracing::info!("Admin unlocked");
    Ok(super::with_session(
        &state,
        SessionKind::Admin,
        &token,
        ApiResponse::ok(),
    ))
}

pub async fn logout(State(state): State<AppState>) -> Response {
    super::logout(&state, SessionKind::Admin)
}

pub async fn session(_admin: Authenticated<AdminClaims>) -> ApiResponse<()> {
    ApiResponse::ok()
}

pub async fn settings(
    State(state): State<AppState>,
    _admin: Authenticated<AdminClaims>,
) -> AppResult<ApiResponse<SettingsBody>> {
    let active_event_id = state
        .store
        .active_event_id()
        .await
        .map_err(ServiceError::from)?;
    let events = state.store.list_events().await.map_err(ServiceError::from)?;
    Ok(ApiResponse::success(SettingsBody {
        active_event_id,
        events,
    }))
}

pub async fn update_settings(
    State(state): State<AppState>,
    _admin: Authenticated<AdminClaims>,
    AppJson(req): AppJson<SettingsUpdate>,
) -> AppResult<ApiResponse<ActiveEventBody>> {
    let event_id = req
        .active_event_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::required_field("activeEventId"))?;

    let ctx = tenant::activate(state.store.as_ref(), event_id).await?;
    Ok(ApiResponse::success(ActiveEventBody {
        active_event_id: ctx.event_id,
    }))
}

/// Archive an event. The active event has to be switched away from first.
pub async fn archive_event(
    State(state): State<AppState>,
    _admin: Authenticated<AdminClaims>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let active = state
        .store
        .active_event_id()
        .await
        .map_err(ServiceError::from)?;
    if active.as_deref() == Some(id.as_str()) {
        return Err(AppError::new(ErrorCode::EventActive).with_detail("eventId", id));
    }

    if !state.store.archive_event(&id).await.map_err(ServiceError::from)? {
        return Err(AppError::new(ErrorCode::EventNotFound).with_detail("eventId", id));
    }
    tracing::info!(event_id = %id, "Event archived");
    Ok(ApiResponse::ok())
}

pub async fn set_location_pin(
    State(state): State<AppState>,
    _admin: Authenticated<AdminClaims>,
    ActiveEvent(ctx): ActiveEvent,
    Path(id): Path<String>,
    AppJson(req): AppJson<PinRequest>,
) -> AppResult<ApiResponse<()>> {
    let pin = PinPolicy::AdminSet.validate(&req.pin)?.to_string();

    let in_event = state
        .store
        .find_location(&id)
        .await
        .map_err(ServiceError::from)?
        .is_some_and(|l| l.event_id == ctx.event_id);
    if !in_event {
        return Err(AppError::new(ErrorCode::LocationNotFound).with_detail("locationId", id));
    }

    let hash = pin::hash_pin_blocking(pin).await?;
    state
        .store
        .set_location_pin(&id, &hash)
        .await
        .map_err(ServiceError::from)?;
    tracing::info!(location_id = %id, "Location PIN updated");
    Ok(ApiResponse::ok())
}

pub async fn set_runner_pin(
    State(state): State<AppState>,
    _admin: Authenticated<AdminClaims>,
    ActiveEvent(ctx): ActiveEvent,
    Path(id): Path<String>,
    AppJson(req): AppJson<PinRequest>,
) -> AppResult<ApiResponse<()>> {
    let pin = PinPolicy::AdminSet.validate(&req.pin)?.to_string();

    let in_event = state
        .store
        .find_runner(&id)
        .await
        .map_err(ServiceError::from)?
        .is_some_and(|r| r.event_id == ctx.event_id);
    if !in_event {
        return Err(AppError::new(ErrorCode::RunnerNotFound).with_detail("runnerId", id));
    }

    let hash = pin::hash_pin_blocking(pin).await?;
    state
        .store
        .set_runner_pin(&id, &hash)
        .await
        .map_err(ServiceError::from)?;
    tracing::info!(runner_id = %id, "Runner PIN updated");
    Ok(ApiResponse::ok())
}
