//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on the domain services and remain testable without real adapters behind
//! them.

use std::sync::Arc;

use crate::domain::{
    EnrollmentService, EventCatalogService, EventListingService, OffboardingService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Capacity allocation and waitlist promotion.
    pub enrollment: Arc<EnrollmentService>,
    /// Event creation, edits, rosters, analytics, lifecycle.
    pub catalog: Arc<EventCatalogService>,
    /// Filtered, ranked listings.
    pub listing: Arc<EventListingService>,
    /// Account departure cascade.
    pub offboarding: Arc<OffboardingService>,
}
