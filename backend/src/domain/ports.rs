//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the engine expects to interact with driven adapters
//! (stores, the user directory, the notification sink). Each trait exposes
//! strongly typed errors so adapters map their failures into predictable
//! variants instead of returning `anyhow::Result`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::event::{Event, EventStatus};
use super::ids::{EventId, RegistrationId, UserId};
use super::registration::{Registration, RegistrationStatus};

/// Errors surfaced by the event store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventStoreError {
    /// Store connectivity or transaction failures.
    #[error("event store connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("event store query failed: {message}")]
    Query {
        /// Adapter-supplied failure detail.
        message: String,
    },
}

impl EventStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the registration store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationStoreError {
    /// Store connectivity or transaction failures.
    #[error("registration store connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("registration store query failed: {message}")]
    Query {
        /// Adapter-supplied failure detail.
        message: String,
    },
}

impl RegistrationStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the user directory adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserDirectoryError {
    /// Directory backend unavailable.
    #[error("user directory unavailable: {message}")]
    Unavailable {
        /// Adapter-supplied failure detail.
        message: String,
    },
}

impl UserDirectoryError {
    /// Helper for backend failures.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// A send failed for one recipient.
    #[error("notification send failed: {message}")]
    Send {
        /// Adapter-supplied failure detail.
        message: String,
    },
}

impl NotificationError {
    /// Helper for send failures.
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
        }
    }
}

/// Persistence port for event aggregates.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persist a new event.
    async fn insert(&self, event: &Event) -> Result<(), EventStoreError>;

    /// Replace an existing event.
    async fn update(&self, event: &Event) -> Result<(), EventStoreError>;

    /// Fetch an event by identifier.
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, EventStoreError>;

    /// Fetch every stored event. The read model filters and orders in
    /// memory; see the listing service for the rationale.
    async fn list_all(&self) -> Result<Vec<Event>, EventStoreError>;

    /// Fetch events owned by `host` in the given status.
    async fn list_by_host_and_status(
        &self,
        host: &UserId,
        status: EventStatus,
    ) -> Result<Vec<Event>, EventStoreError>;

    /// Fetch `Active`/`Full` events whose end time precedes `now`.
    async fn list_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Event>, EventStoreError>;

    /// Fetch `Active`/`Full` events starting within `[start, end]`,
    /// the broad pre-filter for the reminder sweep.
    async fn list_reminder_candidates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, EventStoreError>;

    /// Nullify the host reference on all of `host`'s events, returning the
    /// number of affected rows. Events are kept so other users' registration
    /// history survives the host's departure.
    async fn detach_host(&self, host: &UserId) -> Result<usize, EventStoreError>;
}

/// Persistence port for registration rows.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Persist a new row.
    async fn insert(&self, registration: &Registration) -> Result<(), RegistrationStoreError>;

    /// Replace an existing row.
    async fn update(&self, registration: &Registration) -> Result<(), RegistrationStoreError>;

    /// Delete a row outright. Used when replacing a cancelled row on
    /// re-registration and when purging a departed user's history.
    async fn delete(&self, id: &RegistrationId) -> Result<(), RegistrationStoreError>;

    /// Fetch the row for a (user, event) pair, live or cancelled.
    async fn find_by_user_and_event(
        &self,
        user: &UserId,
        event: &EventId,
    ) -> Result<Option<Registration>, RegistrationStoreError>;

    /// Count rows for `event` in `status`.
    async fn count_by_event_and_status(
        &self,
        event: &EventId,
        status: RegistrationStatus,
    ) -> Result<u64, RegistrationStoreError>;

    /// Fetch the waitlist for `event` ordered ascending by `registered_at`
    /// (earliest request first).
    async fn list_waitlist_fifo(
        &self,
        event: &EventId,
    ) -> Result<Vec<Registration>, RegistrationStoreError>;

    /// Fetch rows for `event` in `status`, unordered.
    async fn list_by_event_and_status(
        &self,
        event: &EventId,
        status: RegistrationStatus,
    ) -> Result<Vec<Registration>, RegistrationStoreError>;

    /// Fetch every row for `event` ordered descending by `registered_at`.
    async fn list_by_event(
        &self,
        event: &EventId,
    ) -> Result<Vec<Registration>, RegistrationStoreError>;

    /// Fetch `user`'s rows in `status` across all events.
    async fn list_by_user_and_status(
        &self,
        user: &UserId,
        status: RegistrationStatus,
    ) -> Result<Vec<Registration>, RegistrationStoreError>;

    /// Delete every row belonging to `user`, returning the removed count.
    async fn delete_all_for_user(&self, user: &UserId) -> Result<usize, RegistrationStoreError>;
}

/// Minimal user record consumed from the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable identifier.
    pub id: UserId,
    /// Display name used in rosters and notifications.
    pub name: String,
    /// Delivery address for the email sink.
    pub email: String,
}

/// Lookup port over the external user store. Deleted accounts are invisible
/// through this port.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch an active (non-deleted) user.
    async fn find_active(&self, id: &UserId)
    -> Result<Option<UserProfile>, UserDirectoryError>;
}

/// Email template selector for the notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailKind {
    /// Seat confirmed at registration time.
    RegistrationConfirmation,
    /// Added to the waitlist at registration time.
    WaitlistConfirmation,
    /// Promoted from the waitlist to a confirmed seat.
    WaitlistPromotion,
    /// Upcoming-event reminder inside the configured lead window.
    EventReminder,
    /// Event created confirmation for the host.
    EventCreated,
}

/// Fire-and-forget notification sink.
///
/// Delivery failures are reported per recipient and must never abort the
/// operation that triggered them; callers log and continue.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Record an in-app notification for `user`.
    async fn create_notification(
        &self,
        user: &UserId,
        title: &str,
        message: &str,
    ) -> Result<(), NotificationError>;

    /// Send a templated event email to `recipient`.
    async fn send_event_email(
        &self,
        recipient: &UserProfile,
        kind: EmailKind,
        event: &Event,
    ) -> Result<(), NotificationError>;
}

/// Aggregate rating figures consumed from the feedback collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingSummary {
    /// Mean rating, when any rating exists.
    pub average: Option<f64>,
    /// Number of ratings submitted.
    pub count: u64,
}

/// Read-only port over the external ratings subsystem.
#[async_trait]
pub trait RatingSource: Send + Sync {
    /// Fetch the rating summary for `event`.
    async fn summary(&self, event: &EventId) -> RatingSummary;
}
