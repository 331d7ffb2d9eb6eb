//! Abuse protection for the linking surface.

pub mod rate_limit;

pub use rate_limit::{ExpiringRateLimiter, TokioClock};
