//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::EventNotFound
            | Self::LocationNotFound
            | Self::RunnerNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::EventArchived
            | Self::EventActive
            | Self::OrderTransitionRejected
            | Self::OrderNotArchivable
            | Self::RunnerNotInActiveEvent => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::SessionMismatch => StatusCode::UNAUTHORIZED,

            // 429 Too Many Requests
            Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::NoActiveEvent => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether this code is the expected outcome of two operators racing on
    /// the same record. Clients resync silently instead of alerting.
    pub fn is_conflict(&self) -> bool {
        self.http_status() == StatusCode::CONFLICT
    }
}
