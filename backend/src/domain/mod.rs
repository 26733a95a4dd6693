//! Domain layer: the enrollment engine and its ports.
//!
//! Everything here is adapter-agnostic. Services depend on the port traits
//! in [`ports`] and an injectable [`mockable::Clock`], so the whole layer is
//! exercisable in tests without HTTP, timers, or a real store.

pub mod catalog;
pub mod enrollment;
pub mod error;
pub mod event;
pub mod ids;
pub mod listing;
pub mod offboarding;
pub mod ports;
pub mod registration;
pub mod sweep;
pub mod views;

pub use catalog::EventCatalogService;
pub use enrollment::{EnrollmentService, EventLocks};
pub use error::{Error, ErrorCode};
pub use event::{Event, EventDraft, EventPhase, EventStatus, EventValidationError};
pub use ids::{EventId, IdParseError, RegistrationId, UserId};
pub use listing::{EventFilter, EventListingService};
pub use offboarding::{OffboardingService, RetirementReport};
pub use registration::{Registration, RegistrationStatus};
pub use sweep::{CompletionSweep, ReminderSweep};
pub use views::{
    AnalyticsView, AttendeeView, DailyRegistrationCount, EventCounts, EventView, RegistrationView,
};
