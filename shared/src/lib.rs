//! Shared types for the depot service
//!
//! Error codes, the `{ ok, ... }` response envelope, domain models and a
//! few time/id helpers used by the server and its tests.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
