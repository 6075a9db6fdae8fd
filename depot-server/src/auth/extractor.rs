//! Session extractors
//!
//! Handlers take `Authenticated<C>` to require a valid session of kind
//! `C::KIND`; the rejection is a 401 `AppError`.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use shared::error::AppError;

use super::cookie::read_cookie;
use super::session::{LocationClaims, SessionClaims, SessionError};
use crate::state::AppState;

/// Verified session claims of one kind
#[derive(Debug, Clone)]
pub struct Authenticated<C>(pub C);

impl<C: SessionClaims> FromRequestParts<AppState> for Authenticated<C> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Authenticated<C>>() {
            return Ok(claims.clone());
        }

        let token = read_cookie(&parts.headers, C::KIND.cookie_name()).unwrap_or_default();
        let claims = state.sessions.verify::<C>(token).map_err(|e| {
            reject(C::KIND.as_str(), &e);
            AppError::from(e)
        })?;

        let authenticated = Authenticated(claims);
        parts.extensions.insert(authenticated.clone());
        Ok(authenticated)
    }
}

/// Verify the location session, optionally pinned to the public id the
/// client is routed through
pub fn location_session(
    state: &AppState,
    headers: &HeaderMap,
    expected_public_id: Option<&str>,
) -> Result<LocationClaims, AppError> {
    let token = read_cookie(headers, super::SessionKind::Location.cookie_name()).unwrap_or_default();
    state
        .sessions
        .verify_location(token, expected_public_id)
        .map_err(|e| {
            reject("location", &e);
            AppError::from(e)
        })
}

fn reject(kind: &str, err: &SessionError) {
    tracing::debug!(kind, error = %err, "Session rejected");
}
