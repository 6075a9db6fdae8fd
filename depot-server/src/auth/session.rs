//! Session token service
//!
//! Admin, location and runner sessions are HS256-signed compact tokens.
//! Each kind has its own secret, so a token minted for one kind never
//! verifies as another. Expiry is checked against an injectable clock.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::config::MAX_SESSION_TTL_HOURS;

/// The three session kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Admin,
    Location,
    Runner,
}

impl SessionKind {
    /// Value of the `typ` claim
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Location => "location",
            Self::Runner => "runner",
        }
    }

    /// Name of the cookie carrying this kind of session
    pub fn cookie_name(&self) -> &'static str {
        match self {
            Self::Admin => "admin_session",
            Self::Location => "loc_session",
            Self::Runner => "runner_session",
        }
    }
}

/// Kind-specific claim set carried by a session token
pub trait SessionClaims: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: SessionKind;
}

/// Admin sessions carry nothing beyond type and nonce
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminClaims {}

impl SessionClaims for AdminClaims {
    const KIND: SessionKind = SessionKind::Admin;
}

/// Location session bound to one location and its public id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationClaims {
    /// Location id
    pub loc: String,
    /// Public id the session was unlocked through
    pub pid: String,
}

impl SessionClaims for LocationClaims {
    const KIND: SessionKind = SessionKind::Location;
}

/// Runner session; all fields are absent for shared-PIN unlocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl SessionClaims for RunnerClaims {
    const KIND: SessionKind = SessionKind::Runner;
}

/// Signed payload: fixed header claims plus the kind-specific ones
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload<C> {
    typ: String,
    iat: i64,
    exp: i64,
    jti: String,
    #[serde(flatten)]
    claims: C,
}

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session token")]
    Missing,

    #[error("malformed session token: {0}")]
    Malformed(String),

    #[error("session signature mismatch")]
    BadSignature,

    #[error("session token is of the wrong kind")]
    WrongKind,

    #[error("session expired")]
    Expired,

    #[error("session belongs to another location")]
    PublicIdMismatch,

    #[error("failed to sign session: {0}")]
    Signing(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Missing => AppError::not_authenticated(),
            SessionError::Expired => AppError::token_expired(),
            SessionError::PublicIdMismatch => AppError::new(ErrorCode::SessionMismatch),
            SessionError::Malformed(_) | SessionError::BadSignature | SessionError::WrongKind => {
                AppError::new(ErrorCode::TokenInvalid)
            }
            SessionError::Signing(msg) => AppError::internal(msg),
        }
    }
}

struct SessionKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl SessionKey {
    fn new(secret: &str, ttl_hours: f64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: (ttl_hours.min(MAX_SESSION_TTL_HOURS) * 3600.0).round().max(1.0) as i64,
        }
    }
}

/// Issues and verifies all three session kinds
pub struct SessionService {
    admin: SessionKey,
    location: SessionKey,
    runner: SessionKey,
}

/// Secret and lifetime for one session kind
pub struct SessionKeyConfig<'a> {
    pub secret: &'a str,
    pub ttl_hours: f64,
}

impl SessionService {
    pub fn new(
        admin: SessionKeyConfig<'_>,
        location: SessionKeyConfig<'_>,
        runner: SessionKeyConfig<'_>,
    ) -> Self {
        Self {
            admin: SessionKey::new(admin.secret, admin.ttl_hours),
            location: SessionKey::new(location.secret, location.ttl_hours),
            runner: SessionKey::new(runner.secret, runner.ttl_hours),
        }
    }

    fn key(&self, kind: SessionKind) -> &SessionKey {
        match kind {
            SessionKind::Admin => &self.admin,
            SessionKind::Location => &self.location,
            SessionKind::Runner => &self.runner,
        }
    }

    /// Lifetime of a session kind in seconds (also the cookie Max-Age)
    pub fn ttl_secs(&self, kind: SessionKind) -> i64 {
        self.key(kind).ttl_secs
    }

    /// Mint a token for `claims`, valid from now
    pub fn issue<C: SessionClaims>(&self, claims: C) -> Result<String, SessionError> {
        self.issue_at(claims, shared::util::now_secs())
    }

    /// Mint a token as if the current time were `now` (unix seconds)
    pub fn issue_at<C: SessionClaims>(&self, claims: C, now: i64) -> Result<String, SessionError> {
        let key = self.key(C::KIND);
        let payload = TokenPayload {
            typ: C::KIND.as_str().to_string(),
            iat: now,
            exp: now.saturating_add(key.ttl_secs),
            jti: new_nonce(),
            claims,
        };
        encode(&Header::new(Algorithm::HS256), &payload, &key.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    /// Verify a token of kind `C::KIND` and return its claims
    pub fn verify<C: SessionClaims>(&self, token: &str) -> Result<C, SessionError> {
        self.verify_at(token, shared::util::now_secs())
    }

    /// Verify as if the current time were `now` (unix seconds)
    pub fn verify_at<C: SessionClaims>(&self, token: &str, now: i64) -> Result<C, SessionError> {
        if token.is_empty() {
            return Err(SessionError::Missing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<TokenPayload<C>>(token, &self.key(C::KIND).decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => SessionError::BadSignature,
                _ => SessionError::Malformed(e.to_string()),
            })?;

        let payload = data.claims;
        if payload.typ != C::KIND.as_str() {
            return Err(SessionError::WrongKind);
        }
        if now > payload.exp {
            return Err(SessionError::Expired);
        }
        Ok(payload.claims)
    }

    /// Verify a location token, optionally pinning it to a public id
    pub fn verify_location(
        &self,
        token: &str,
        expected_public_id: Option<&str>,
    ) -> Result<LocationClaims, SessionError> {
        self.verify_location_at(token, expected_public_id, shared::util::now_secs())
    }

    pub fn verify_location_at(
        &self,
        token: &str,
        expected_public_id: Option<&str>,
        now: i64,
    ) -> Result<LocationClaims, SessionError> {
        let claims: LocationClaims = self.verify_at(token, now)?;
        match expected_public_id {
            Some(expected) if expected != claims.pid => Err(SessionError::PublicIdMismatch),
            _ => Ok(claims),
        }
    }
}

/// Random 128-bit nonce, hex encoded
fn new_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;

    fn service() -> SessionService {
        SessionService::new(
            SessionKeyConfig { secret: "admin-secret", ttl_hours: 12.0 },
            SessionKeyConfig { secret: "location-secret", ttl_hours: 12.0 },
            SessionKeyConfig { secret: "runner-secret", ttl_hours: 0.5 },
        )
    }

    fn location_claims() -> LocationClaims {
        LocationClaims {
            loc: "loc-1".to_string(),
            pid: "pub-1".to_string(),
        }
    }

    #[test]
    fn test_round_trip_all_kinds() {
        let service = service();

        let token = service.issue_at(AdminClaims {}, NOW).unwrap();
        assert_eq!(service.verify_at::<AdminClaims>(&token, NOW + 60).unwrap(), AdminClaims {});

        let token = service.issue_at(location_claims(), NOW).unwrap();
        assert_eq!(
            service.verify_at::<LocationClaims>(&token, NOW + 60).unwrap(),
            location_claims()
        );

        let runner = RunnerClaims {
            runner_id: Some("r-1".to_string()),
            runner_name: Some("Sam".to_string()),
            event_id: Some("e-1".to_string()),
        };
        let token = service.issue_at(runner.clone(), NOW).unwrap();
        assert_eq!(service.verify_at::<RunnerClaims>(&token, NOW + 60).unwrap(), runner);

        let token = service.issue_at(RunnerClaims::default(), NOW).unwrap();
        assert_eq!(
            service.verify_at::<RunnerClaims>(&token, NOW).unwrap(),
            RunnerClaims::default()
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let service = service();
        let token = service.issue_at(location_claims(), NOW).unwrap();
        let exp = NOW + 12 * 3600;

        assert!(service.verify_at::<LocationClaims>(&token, exp).is_ok());
        assert!(matches!(
            service.verify_at::<LocationClaims>(&token, exp + 1),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn test_fractional_ttl() {
        let service = service();
        assert_eq!(service.ttl_secs(SessionKind::Runner), 1800);
        let token = service.issue_at(RunnerClaims::default(), NOW).unwrap();
        assert!(matches!(
            service.verify_at::<RunnerClaims>(&token, NOW + 1801),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn test_oversized_ttl_is_capped() {
        let service = SessionService::new(
            SessionKeyConfig { secret: "admin-secret", ttl_hours: 1e16 },
            SessionKeyConfig { secret: "location-secret", ttl_hours: f64::MAX },
            SessionKeyConfig { secret: "runner-secret", ttl_hours: 1.0 },
        );
        let year = (MAX_SESSION_TTL_HOURS * 3600.0) as i64;
        assert_eq!(service.ttl_secs(SessionKind::Admin), year);
        assert_eq!(service.ttl_secs(SessionKind::Location), year);

        let token = service.issue_at(AdminClaims {}, NOW).unwrap();
        assert!(service.verify_at::<AdminClaims>(&token, NOW + 1).is_ok());
        assert!(matches!(
            service.verify_at::<AdminClaims>(&token, NOW + year + 1),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn test_cross_kind_rejected() {
        let service = service();
        let token = service.issue_at(AdminClaims {}, NOW).unwrap();

        assert!(matches!(
            service.verify_at::<RunnerClaims>(&token, NOW),
            Err(SessionError::BadSignature)
        ));
        assert!(service.verify_at::<LocationClaims>(&token, NOW).is_err());
    }

    #[test]
    fn test_wrong_kind_with_shared_secret() {
        let shared = SessionService::new(
            SessionKeyConfig { secret: "same", ttl_hours: 1.0 },
            SessionKeyConfig { secret: "same", ttl_hours: 1.0 },
            SessionKeyConfig { secret: "same", ttl_hours: 1.0 },
        );
        let token = shared.issue_at(RunnerClaims::default(), NOW).unwrap();
        assert!(matches!(
            shared.verify_at::<AdminClaims>(&token, NOW),
            Err(SessionError::WrongKind)
        ));
    }

    #[test]
    fn test_tampering_detected() {
        let service = service();
        let token = service.issue_at(location_claims(), NOW).unwrap();

        for idx in 0..token.len() {
            for bit in 0..8 {
                let mut tampered = token.as_bytes().to_vec();
                tampered[idx] ^= 1 << bit;
                // a flip out of ASCII is not a string at all
                let Ok(tampered) = String::from_utf8(tampered) else {
                    continue;
                };
                assert!(
                    service.verify_at::<LocationClaims>(&tampered, NOW).is_err(),
                    "flipping bit {bit} of byte {idx} was accepted"
                );
            }
        }
    }

    #[test]
    fn test_garbage_and_empty() {
        let service = service();
        assert!(matches!(
            service.verify_at::<AdminClaims>("", NOW),
            Err(SessionError::Missing)
        ));
        assert!(matches!(
            service.verify_at::<AdminClaims>("not-a-token", NOW),
            Err(SessionError::Malformed(_))
        ));
    }

    #[test]
    fn test_nonce_makes_tokens_unique() {
        let service = service();
        let a = service.issue_at(AdminClaims {}, NOW).unwrap();
        let b = service.issue_at(AdminClaims {}, NOW).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_public_id_binding() {
        let service = service();
        let token = service.issue_at(location_claims(), NOW).unwrap();

        assert!(service.verify_location_at(&token, Some("pub-1"), NOW).is_ok());
        assert!(service.verify_location_at(&token, None, NOW).is_ok());
        assert!(matches!(
            service.verify_location_at(&token, Some("pub-2"), NOW),
            Err(SessionError::PublicIdMismatch)
        ));
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(AppError::from(SessionError::Missing).code, ErrorCode::NotAuthenticated);
        assert_eq!(AppError::from(SessionError::Expired).code, ErrorCode::TokenExpired);
        assert_eq!(AppError::from(SessionError::BadSignature).code, ErrorCode::TokenInvalid);
        assert_eq!(
            AppError::from(SessionError::PublicIdMismatch).code,
            ErrorCode::SessionMismatch
        );
    }
}
