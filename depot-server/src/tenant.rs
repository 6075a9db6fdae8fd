//! Active-event resolution
//!
//! Every location and runner operation is scoped to the one active event.
//! The pointer is read once per request into a [`TenantContext`] which is
//! then passed explicitly to the order engine.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shared::error::{AppError, ErrorCode};

use crate::db::Store;
use crate::error::ServiceResult;
use crate::state::AppState;

/// The event a request operates in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub event_id: String,
}

impl TenantContext {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
        }
    }

    /// Read the active event pointer. An unset pointer is a server
    /// misconfiguration, not a client error.
    pub async fn resolve(store: &dyn Store) -> ServiceResult<Self> {
        match store.active_event_id().await? {
            Some(event_id) => Ok(Self { event_id }),
            None => {
                tracing::error!("No active event configured");
                Err(AppError::new(ErrorCode::NoActiveEvent).into())
            }
        }
    }
}

/// Point the active event at `event_id` after checking it exists and is
/// still open
pub async fn activate(store: &dyn Store, event_id: &str) -> ServiceResult<TenantContext> {
    let event = store
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::EventNotFound).with_detail("eventId", event_id))?;

    if event.is_archived() {
        return Err(AppError::new(ErrorCode::EventArchived)
            .with_detail("eventId", event_id)
            .into());
    }

    store.set_active_event_id(&event.id).await?;
    tracing::info!(event_id = %event.id, event_name = %event.name, "Active event changed");
    Ok(TenantContext::new(event.id))
}

/// Extractor resolving the active event for a handler
#[derive(Debug, Clone)]
pub struct ActiveEvent(pub TenantContext);

impl FromRequestParts<AppState> for ActiveEvent {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = TenantContext::resolve(state.store.as_ref()).await?;
        Ok(ActiveEvent(ctx))
    }
}
