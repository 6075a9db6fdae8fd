//! Unified error system for the depot service
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified `{ ok, ... }` response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Event errors
//! - 4xxx: Order errors
//! - 5xxx: Location errors
//! - 6xxx: Item errors
//! - 7xxx: Runner errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::OrderTransitionRejected);
//! assert!(err.is_conflict());
//!
//! let err = AppError::new(ErrorCode::ItemNotAssigned)
//!     .with_detail("itemIds", serde_json::json!(["cola"]));
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert!(!response.ok);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
