//! Capacity-bounded event enrollment engine.
//!
//! The domain layer owns registration, waitlisting, promotion, and event
//! lifecycle rules behind port traits; inbound HTTP handlers and the sweep
//! scheduler drive it, and outbound adapters implement its ports.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod scheduler;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
