//! Order engine: intake, status lifecycle and queue views
//!
//! Every function takes the store and the request's [`TenantContext`]
//! explicitly.
//!
//! [`TenantContext`]: crate::tenant::TenantContext

pub mod intake;
pub mod lifecycle;
pub mod queue;

pub use intake::{OrderDraft, create_order};
pub use lifecycle::{archive, transition};
pub use queue::{location_orders, runner_queue, sort_queue};
