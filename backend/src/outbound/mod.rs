//! Driven adapters implementing the domain ports.

pub mod memory;
pub mod notify;

pub use memory::{InMemoryEventRepository, InMemoryRegistrationRepository, InMemoryUserDirectory};
pub use notify::{NoRatings, TracingNotificationSink};
