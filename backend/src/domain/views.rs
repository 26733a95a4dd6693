//! Read projections returned to inbound adapters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::event::{Event, EventStatus, TRENDING_THRESHOLD};
use super::ids::{EventId, RegistrationId, UserId};
use super::registration::{Registration, RegistrationStatus};
use super::ports::RatingSummary;

/// Registered/waitlist tallies computed on demand per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventCounts {
    /// Rows holding a confirmed seat.
    pub registered: u64,
    /// Rows queued on the waitlist.
    pub waitlisted: u64,
}

impl EventCounts {
    /// Seats still available, saturating at zero when overshot.
    pub fn available_seats(&self, max_participants: u32) -> u64 {
        u64::from(max_participants).saturating_sub(self.registered)
    }
}

/// Event projection with derived figures and caller context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
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
    /// Scheduled end instant.
    pub event_end_time: DateTime<Utc>,
    /// Registration cut-off.
    pub registration_deadline: DateTime<Utc>,
    /// Seat capacity.
    pub max_participants: u32,
    /// Optional reminder lead time in hours.
    pub reminder_lead_hours: Option<u32>,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Owning host, when still attached.
    pub host_id: Option<UserId>,
    /// Confirmed-seat count.
    pub registered_count: u64,
    /// Waitlist length.
    pub waitlist_count: u64,
    /// Remaining seats.
    pub available_seats: u64,
    /// Whether the registered count exceeds the trending threshold.
    pub trending: bool,
    /// Mean rating from the feedback collaborator, when any.
    pub average_rating: Option<f64>,
    /// Number of ratings submitted.
    pub rating_count: u64,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
    /// The caller's registration status for this event, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_registration_status: Option<RegistrationStatus>,
}

impl EventView {
    /// Project an event together with its derived figures.
    pub fn project(
        event: &Event,
        counts: EventCounts,
        ratings: RatingSummary,
        caller_registration_status: Option<RegistrationStatus>,
    ) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            venue: event.venue.clone(),
            category: event.category.clone(),
            event_date: event.event_date,
            event_end_time: event.event_end_time,
            registration_deadline: event.registration_deadline,
            max_participants: event.max_participants,
            reminder_lead_hours: event.reminder_lead_hours,
            status: event.status,
            host_id: event.host,
            registered_count: counts.registered,
            waitlist_count: counts.waitlisted,
            available_seats: counts.available_seats(event.max_participants),
            trending: counts.registered > TRENDING_THRESHOLD,
            average_rating: ratings.average,
            rating_count: ratings.count,
            created_at: event.created_at,
            updated_at: event.updated_at,
            caller_registration_status,
        }
    }
}

/// Registration projection returned after register/cancel operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    /// Stable identifier.
    pub id: RegistrationId,
    /// Registering user.
    pub user_id: UserId,
    /// Owning event.
    pub event_id: EventId,
    /// Event title for display.
    pub event_title: String,
    /// Row status.
    pub status: RegistrationStatus,
    /// Creation instant.
    pub registered_at: DateTime<Utc>,
}

impl RegistrationView {
    /// Project a registration together with its event title.
    pub fn project(registration: &Registration, event_title: &str) -> Self {
        Self {
            id: registration.id,
            user_id: registration.user,
            event_id: registration.event,
            event_title: event_title.to_owned(),
            status: registration.status,
            registered_at: registration.registered_at,
        }
    }
}

/// Host-facing roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeView {
    /// Attendee identifier.
    pub user_id: UserId,
    /// Display name, or a placeholder for departed accounts.
    pub name: String,
    /// Delivery address, when the account still exists.
    pub email: Option<String>,
    /// Row status.
    pub status: RegistrationStatus,
    /// Creation instant.
    pub registered_at: DateTime<Utc>,
}

/// One day's worth of confirmed registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRegistrationCount {
    /// UTC calendar date bucket.
    pub date: NaiveDate,
    /// Confirmed registrations created on that date.
    pub count: u64,
}

/// Host-facing analytics aggregate for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsView {
    /// Event identifier.
    pub event_id: EventId,
    /// Event title for display.
    pub event_title: String,
    /// Confirmed-seat count.
    pub total_registrations: u64,
    /// Waitlist length.
    pub waitlist_count: u64,
    /// Registered count over capacity, as a percentage with one decimal.
    pub fill_percentage: f64,
    /// Seat capacity.
    pub max_participants: u32,
    /// Remaining seats.
    pub available_seats: u64,
    /// Mean rating from the feedback collaborator, when any.
    pub average_rating: Option<f64>,
    /// Number of ratings submitted.
    pub rating_count: u64,
    /// Confirmed registrations bucketed by UTC date, ascending.
    pub daily_registration_counts: Vec<DailyRegistrationCount>,
}
