//! HTTP routes for depot-server
//!
//! Everything is mounted under `/api`. Unlock routes are rate-limited per
//! client IP.

pub mod admin;
pub mod health;
pub mod json;
pub mod location;
pub mod orders;
pub mod runner;

use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Router, middleware};
use serde::Serialize;
use shared::error::ApiResponse;
use tower_http::trace::TraceLayer;

use crate::auth::SessionKind;
use crate::auth::cookie::{clear_cookie, session_cookie};
use crate::auth::rate_limit::unlock_rate_limit;
use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // PIN unlocks (rate-limited)
    let unlock = Router::new()
        .route("/admin/unlock", post(admin::unlock))
        .route("/location/unlock", post(location::unlock))
        .route("/runner/unlock", post(runner::unlock))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            unlock_rate_limit,
        ));

    let admin = Router::new()
        .route("/admin/logout", post(admin::logout))
        .route("/admin/session", get(admin::session))
        .route("/admin/settings", get(admin::settings).patch(admin::update_settings))
        .route("/admin/events/{id}/archive", post(admin::archive_event))
        .route("/admin/locations/{id}/pin", post(admin::set_location_pin))
        .route("/admin/runners/{id}/pin", post(admin::set_runner_pin));

    let location = Router::new()
        .route("/location/logout", post(location::logout))
        .route("/location/session", get(location::session))
        .route("/location/items", get(location::items))
        .route("/location/orders", get(location::orders));

    let runner = Router::new()
        .route("/runner/logout", post(runner::logout))
        .route("/runner/session", get(runner::session))
        .route("/runner/list", get(runner::list))
        .route("/runner/orders", get(runner::orders));

    let orders = Router::new()
        .route("/orders", post(orders::create))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/orders/{id}/archive", post(orders::archive));

    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/meta", get(health::meta))
        .merge(unlock)
        .merge(admin)
        .merge(location)
        .merge(runner)
        .merge(orders);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Success body plus a fresh session cookie
pub(crate) fn with_session<T: Serialize>(
    state: &AppState,
    kind: SessionKind,
    token: &str,
    body: ApiResponse<T>,
) -> Response {
    let cookie = session_cookie(
        kind,
        token,
        state.sessions.ttl_secs(kind),
        state.cookie_secure,
    );
    ([(SET_COOKIE, cookie)], body).into_response()
}

/// `{ok: true}` plus an expired session cookie
pub(crate) fn logout(state: &AppState, kind: SessionKind) -> Response {
    let cookie = clear_cookie(kind, state.cookie_secure);
    ([(SET_COOKIE, cookie)], ApiResponse::ok()).into_response()
}
