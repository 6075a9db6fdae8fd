//! Runner API handlers
//!
//! POST /api/runner/unlock   - runnerId + PIN (or the shared PIN) → runner session cookie
//! POST /api/runner/logout   - clear the cookie
//! GET  /api/runner/session  - re-validate and echo the claims
//! GET  /api/runner/list     - active runners of the active event
//! GET  /api/runner/orders   - the active queue

use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};

use super::json::AppJson;
use crate::auth::pin::{self, PinPolicy};
use crate::auth::{Authenticated, RunnerClaims, SessionKind};
use crate::error::ServiceError;
use crate::orders::{self, queue::RunnerQueueEntry};
use crate::state::AppState;
use crate::tenant::{ActiveEvent, TenantContext};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    #[serde(default)]
    pub runner_id: Option<String>,
    #[serde(default)]
    pub pin: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    pub runner_name: Option<String>,
    pub runner_id: Option<String>,
    pub event_id: Option<String>,
}

#[derive(Serialize)]
pub struct RunnerEntry {
    pub id: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct ListBody {
    pub runners: Vec<RunnerEntry>,
}

#[derive(Serialize)]
pub struct OrdersBody {
    pub orders: Vec<RunnerQueueEntry>,
}

/// With `runnerId`: the runner's own PIN. Without: the shared runner PIN.
pub async fn unlock(
    State(state): State<AppState>,
    AppJson(req): AppJson<UnlockRequest>,
) -> AppResult<Response> {
    let runner_id = req
        .runner_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let claims = match runner_id {
        Some(runner_id) => {
            let ctx = TenantContext::resolve(state.store.as_ref()).await?;
            unlock_runner(&state, &ctx, runner_id, &req.pin).await?
        }
        None => unlock_shared(&state, &req.pin)?,
    };

    let token = state.sessions.issue(claims.clone())?;
    tracing::info!(runner_id = ?claims.runner_id, "Runner unlocked");
    Ok(super::with_session(
        &state,
        SessionKind::Runner,
        &token,
        ApiResponse::success(UnlockBody {
            runner_name: claims.runner_name,
        }),
    ))
}

async fn unlock_runner(
    state: &AppState,
    ctx: &TenantContext,
    runner_id: &str,
    pin: &str,
) -> AppResult<RunnerClaims> {
    let pin = PinPolicy::Unlock.validate(pin)?;

    let runner = state
        .store
        .find_runner(runner_id)
        .await
        .map_err(ServiceError::from)?
        .filter(|r| r.active)
        .ok_or_else(|| AppError::new(ErrorCode::RunnerNotFound).with_detail("runnerId", runner_id))?;

    if runner.event_id != ctx.event_id {
        return Err(AppError::new(ErrorCode::RunnerNotInActiveEvent).with_detail("runnerId", runner_id));
    }

    let verified = match runner.pin_hash.clone() {
        Some(hash) => pin::verify_pin_blocking(pin.to_string(), hash).await,
        None => false,
    };
    if !verified {
        tracing::warn!(kind = "runner", runner_id, "Unlock failed: wrong PIN");
        return Err(AppError::invalid_credentials());
    }

    Ok(RunnerClaims {
        runner_id: Some(runner.id),
        runner_name: Some(runner.name),
        event_id: Some(runner.event_id),
    })
}

fn unlock_shared(state: &AppState, pin: &str) -> AppResult<RunnerClaims> {
    let Some(expected) = state.runner_access_pin.as_deref() else {
        return Err(AppError::required_field("runnerId"));
    };
    if !pin::matches_configured(pin.trim(), expected) {
        tracing::warn!(kind = "runner", "Unlock failed: wrong shared PIN");
        return Err(AppError::invalid_credentials());
    }
    Ok(RunnerClaims::default())
}

pub async fn logout(State(state): State<AppState>) -> Response {
    super::logout(&state, SessionKind::Runner)
}

pub async fn session(
    Authenticated(claims): Authenticated<RunnerClaims>,
) -> ApiResponse<SessionBody> {
    ApiResponse::success(SessionBody {
        runner_name: claims.runner_name,
        runner_id: claims.runner_id,
        event_id: claims.event_id,
    })
}

pub async fn list(
    State(state): State<AppState>,
    ActiveEvent(ctx): ActiveEvent,
) -> AppResult<ApiResponse<ListBody>> {
    let runners = state
        .store
        .list_active_runners(&ctx.event_id)
        .await
        .map_err(ServiceError::from)?
        .into_iter()
        .map(|r| RunnerEntry {
            id: r.id,
            name: r.name,
        })
        .collect();
    Ok(ApiResponse::success(ListBody { runners }))
}

pub async fn orders(
    State(state): State<AppState>,
    _runner: Authenticated<RunnerClaims>,
    ActiveEvent(ctx): ActiveEvent,
) -> AppResult<ApiResponse<OrdersBody>> {
    let orders = orders::runner_queue(state.store.as_ref(), &ctx).await?;
    Ok(ApiResponse::success(OrdersBody { orders }))
}
