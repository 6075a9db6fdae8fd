//! Data models
//!
//! Shared between the depot server and its browser clients (via API).
//! Ids are opaque strings, timestamps are UTC milliseconds. Struct fields
//! serialize camelCase, enum values snake_case.

pub mod event;
pub mod item;
pub mod location;
pub mod order;
pub mod runner;

// Re-exports
pub use event::*;
pub use item::*;
pub use location::*;
pub use order::*;
pub use runner::*;
