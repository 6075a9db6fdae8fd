//! Unified error codes for the depot service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Event errors
//! - 4xxx: Order errors
//! - 5xxx: Location errors
//! - 7xxx: Runner errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that the browser clients
/// can switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// No session cookie was presented
    NotAuthenticated = 1001,
    /// Wrong PIN
    InvalidCredentials = 1002,
    /// Session token has expired
    TokenExpired = 1003,
    /// Session token is malformed, forged or of the wrong kind
    TokenInvalid = 1004,
    /// Session was minted for a different location
    SessionMismatch = 1005,
    /// Too many unlock attempts
    TooManyAttempts = 1006,
    /// PIN does not have the required shape
    InvalidPinFormat = 1007,

    // ==================== 3xxx: Event ====================
    /// No active event configured
    NoActiveEvent = 3001,
    /// Event not found
    EventNotFound = 3002,
    /// Event is archived
    EventArchived = 3003,
    /// Event is the active event
    EventActive = 3004,

    // ==================== 4xxx: Order ====================
    /// Status change not allowed from the current status
    OrderTransitionRejected = 4002,
    /// Order is not delivered or already archived
    OrderNotArchivable = 4003,
    /// Order has no valid lines
    OrderEmpty = 4004,
    /// Unknown order status value
    InvalidOrderStatus = 4005,
    /// Item is not assigned to the ordering location
    ItemNotAssigned = 4006,

    // ==================== 5xxx: Location ====================
    /// Location not found or inactive
    LocationNotFound = 5001,

    // ==================== 7xxx: Runner ====================
    /// Runner not found or inactive
    RunnerNotFound = 7001,
    /// Runner belongs to another event
    RunnerNotInActiveEvent = 7002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "Not unlocked",
            ErrorCode::InvalidCredentials => "Wrong PIN",
            ErrorCode::TokenExpired => "Session has expired",
            ErrorCode::TokenInvalid => "Session is invalid",
            ErrorCode::SessionMismatch => "Session belongs to another location",
            ErrorCode::TooManyAttempts => "Too many attempts, try again later",
            ErrorCode::InvalidPinFormat => "PIN has an invalid format",

            // Event
            ErrorCode::NoActiveEvent => "No active event configured",
            ErrorCode::EventNotFound => "Event not found",
            ErrorCode::EventArchived => "Archived event cannot be activated",
            ErrorCode::EventActive => "Active event cannot be archived",

            // Order
            ErrorCode::OrderTransitionRejected => {
                "Status change not possible (order may have changed already)"
            }
            ErrorCode::OrderNotArchivable => "Only delivered orders can be archived",
            ErrorCode::OrderEmpty => "Order has no valid lines",
            ErrorCode::InvalidOrderStatus => "Invalid order status",
            ErrorCode::ItemNotAssigned => "An item is not enabled for this location",

            // Location
            ErrorCode::LocationNotFound => "Location not found or inactive",

            // Runner
            ErrorCode::RunnerNotFound => "Runner not found or inactive",
            ErrorCode::RunnerNotInActiveEvent => "Runner does not belong to the active event",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Server configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::SessionMismatch),
            1006 => Ok(ErrorCode::TooManyAttempts),
            1007 => Ok(ErrorCode::InvalidPinFormat),

            // Event
            3001 => Ok(ErrorCode::NoActiveEvent),
            3002 => Ok(ErrorCode::EventNotFound),
            3003 => Ok(ErrorCode::EventArchived),
            3004 => Ok(ErrorCode::EventActive),

            // Order
            4002 => Ok(ErrorCode::OrderTransitionRejected),
            4003 => Ok(ErrorCode::OrderNotArchivable),
            4004 => Ok(ErrorCode::OrderEmpty),
            4005 => Ok(ErrorCode::InvalidOrderStatus),
            4006 => Ok(ErrorCode::ItemNotAssigned),

            // Location
            5001 => Ok(ErrorCode::LocationNotFound),

            // Runner
            7001 => Ok(ErrorCode::RunnerNotFound),
            7002 => Ok(ErrorCode::RunnerNotInActiveEvent),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
