//! Registration entry for a (user, event) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, RegistrationId, UserId};

/// Status of a registration row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    /// Holds a confirmed seat.
    Registered,
    /// Queued behind capacity; promoted FIFO as seats free.
    Waitlist,
    /// Cancelled by the user. Never mutated back to an active status;
    /// re-registration replaces the row so `registered_at` reflects the
    /// latest attempt.
    Cancelled,
}

impl RegistrationStatus {
    /// Whether this row still occupies a seat or queue position.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Registered | Self::Waitlist)
    }
}

/// A user's registration for one event.
///
/// At most one live row exists per (user, event) pair. `registered_at` is
/// set once at creation and orders the waitlist queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Stable identifier.
    pub id: RegistrationId,
    /// Registering user; a reference, not owned.
    pub user: UserId,
    /// Owning event.
    pub event: EventId,
    /// Row status.
    pub status: RegistrationStatus,
    /// Creation instant; FIFO promotion key.
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    /// Build a fresh registration row.
    pub fn new(
        user: UserId,
        event: EventId,
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RegistrationId::random(),
            user,
            event,
            status,
            registered_at: now,
        }
    }
}
