//! PIN unlock sessions

pub mod cookie;
pub mod extractor;
pub mod pin;
pub mod rate_limit;
pub mod session;

pub use extractor::{Authenticated, location_session};
pub use pin::PinPolicy;
pub use rate_limit::RateLimiter;
pub use session::{
    AdminClaims, LocationClaims, RunnerClaims, SessionClaims, SessionError, SessionKind,
    SessionService,
};
