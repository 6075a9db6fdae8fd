//! depot-server - event logistics backend
//!
//! Locations (bars, food stands) order replenishment, runners deliver it and
//! admins manage the active event. Access is PIN based: each unlock trades a
//! PIN for a signed session cookie of its kind.
//!
//! # Module layout
//!
//! - [`api`] - HTTP routes under `/api`
//! - [`auth`] - session tokens, cookies, PIN policy, unlock rate limiting
//! - [`orders`] - order intake, status lifecycle and queue views
//! - [`tenant`] - active event resolution
//! - [`db`] - datastore seam with Postgres and in-memory backends

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod orders;
pub mod state;
pub mod tenant;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> axum::Router {
    api::create_router(state)
}
