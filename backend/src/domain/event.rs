//! Event aggregate and lifecycle rules.
//!
//! The lifecycle state machine lives here as pure methods on [`Event`]:
//! status re-derivation from registration counts, terminal-state absorption,
//! phase bucketing for the read model, and the per-event reminder window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{EventId, UserId};

/// Default event duration applied when no explicit end time is supplied.
pub const DEFAULT_DURATION_HOURS: i64 = 2;
/// Inclusive bounds for the configurable reminder lead time, in hours.
pub const REMINDER_LEAD_HOURS_RANGE: std::ops::RangeInclusive<u32> = 1..=72;
/// Half-width of the reminder window around the ideal reminder instant.
pub const REMINDER_TOLERANCE_MINUTES: i64 = 10;
/// Registered count above which an event is reported as trending.
pub const TRENDING_THRESHOLD: u64 = 50;

/// Lifecycle status of an event.
///
/// `Suspended` and `Completed` are absorbing: no transition leads out of
/// them, and count-driven re-derivation skips them entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Open: registered count below capacity.
    Active,
    /// Registered count has reached capacity; waitlisting applies.
    Full,
    /// Hidden from listings after the host was removed.
    Suspended,
    /// The event has fully ended.
    Completed,
}

/// Read-model phase bucket derived from status and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventPhase {
    /// Registration deadline has not passed and the event is not completed.
    Open,
    /// Registration closed but the event has not completed.
    RegistrationClosed,
    /// The event completed.
    Completed,
}

/// Validation errors raised when constructing or updating an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventValidationError {
    /// `registration_deadline` must strictly precede `event_date`.
    #[error("registration deadline must be before event date")]
    DeadlineNotBeforeStart,
    /// Capacity must admit at least one participant.
    #[error("event capacity must be at least 1")]
    ZeroCapacity,
    /// The reminder lead time falls outside the accepted range.
    #[error("reminder lead time must be between 1 and 72 hours")]
    ReminderLeadOutOfRange,
    /// The end time must not precede the start.
    #[error("event end time must not precede the event date")]
    EndBeforeStart,
}

/// Caller-supplied event attributes, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Display title; opaque to the engine beyond search.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Venue label.
    pub venue: String,
    /// Category label used for exact-match filtering.
    pub category: String,
    /// Scheduled start instant.
    pub event_date: DateTime<Utc>,
    /// Scheduled end instant; defaults to start plus two hours.
    pub event_end_time: Option<DateTime<Utc>>,
    /// Instant after which registration attempts are rejected.
    pub registration_deadline: DateTime<Utc>,
    /// Seat capacity; must be at least one.
    pub max_participants: u32,
    /// Optional reminder lead time in hours before the start.
    pub reminder_lead_hours: Option<u32>,
}

impl EventDraft {
    fn validate(&self) -> Result<(), EventValidationError> {
        if self.registration_deadline >= self.event_date {
            return Err(EventValidationError::DeadlineNotBeforeStart);
        }
        if self.max_participants == 0 {
            return Err(EventValidationError::ZeroCapacity);
        }
        if let Some(lead) = self.reminder_lead_hours
            && !REMINDER_LEAD_HOURS_RANGE.contains(&lead)
        {
            return Err(EventValidationError::ReminderLeadOutOfRange);
        }
        if let Some(end) = self.event_end_time
            && end < self.event_date
        {
            return Err(EventValidationError::EndBeforeStart);
        }
        Ok(())
    }

    fn resolved_end_time(&self) -> DateTime<Utc> {
        self.event_end_time
            .unwrap_or_else(|| self.event_date + Duration::hours(DEFAULT_DURATION_HOURS))
    }
}

/// Scheduled event with capacity-bounded enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Stable identifier.
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Venue label.
    pub venue: String,
    /// Category label.
    pub category: String,
    /// Scheduled start instant.
    pub event_date: DateTime<Utc>,
    /// Scheduled end instant; completion compares against this, not the
    /// start, so an event stays editable until it has fully ended.
    pub event_end_time: DateTime<Utc>,
    /// Registration cut-off; strictly precedes `event_date`.
    pub registration_deadline: DateTime<Utc>,
    /// Seat capacity.
    pub max_participants: u32,
    /// Optional reminder lead time in hours.
    pub reminder_lead_hours: Option<u32>,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Owning host; `None` after the host account was removed.
    pub host: Option<UserId>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Validate a draft and build a new `Active` event owned by `host`.
    pub fn create(
        host: UserId,
        draft: EventDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, EventValidationError> {
        draft.validate()?;
        let event_end_time = draft.resolved_end_time();
        Ok(Self {
            id: EventId::random(),
            title: draft.title,
            description: draft.description,
            venue: draft.venue,
            category: draft.category,
            event_date: draft.event_date,
            event_end_time,
            registration_deadline: draft.registration_deadline,
            max_participants: draft.max_participants,
            reminder_lead_hours: draft.reminder_lead_hours,
            status: EventStatus::Active,
            host: Some(host),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an update draft in place. The caller is responsible for the
    /// terminal-state edit guard and for re-deriving the status afterwards.
    pub fn apply(
        &mut self,
        draft: EventDraft,
        now: DateTime<Utc>,
    ) -> Result<(), EventValidationError> {
        draft.validate()?;
        let event_end_time = draft.resolved_end_time();
        self.title = draft.title;
        self.description = draft.description;
        self.venue = draft.venue;
        self.category = draft.category;
        self.event_date = draft.event_date;
        self.event_end_time = event_end_time;
        self.registration_deadline = draft.registration_deadline;
        self.max_participants = draft.max_participants;
        self.reminder_lead_hours = draft.reminder_lead_hours;
        self.updated_at = now;
        Ok(())
    }

    /// Whether the status is absorbing (`Suspended` or `Completed`).
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, EventStatus::Suspended | EventStatus::Completed)
    }

    /// Re-derive `Active`/`Full` from the registered count. Terminal states
    /// absorb count changes and are left untouched.
    pub fn refresh_status(&mut self, registered_count: u64) {
        if self.is_terminal() {
            return;
        }
        self.status = if registered_count >= u64::from(self.max_participants) {
            EventStatus::Full
        } else {
            EventStatus::Active
        };
    }

    /// Phase bucket used as the primary listing sort key.
    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        if self.status == EventStatus::Completed {
            EventPhase::Completed
        } else if self.registration_deadline < now {
            EventPhase::RegistrationClosed
        } else {
            EventPhase::Open
        }
    }

    /// Inclusive reminder window derived from the configured lead time, or
    /// `None` when no lead time is set.
    pub fn reminder_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let lead = self.reminder_lead_hours?;
        let ideal = self.event_date - Duration::hours(i64::from(lead));
        let tolerance = Duration::minutes(REMINDER_TOLERANCE_MINUTES);
        Some((ideal - tolerance, ideal + tolerance))
    }

    /// Whether `now` falls inside the reminder window.
    pub fn reminder_due(&self, now: DateTime<Utc>) -> bool {
        self.reminder_window()
            .is_some_and(|(start, end)| now >= start && now <= end)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
