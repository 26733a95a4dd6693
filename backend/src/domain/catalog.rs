//! Event catalogue: creation, edits, host lifecycle, completion, analytics.

use std::collections::BTreeMap;
use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::Error;
use super::event::{Event, EventDraft, EventStatus};
use super::ids::{EventId, UserId};
use super::ports::{
    EmailKind, EventRepository, EventStoreError, NotificationSink, RatingSource,
    RegistrationRepository, RegistrationStoreError, UserDirectory, UserDirectoryError,
};
use super::registration::RegistrationStatus;
use super::views::{AnalyticsView, AttendeeView, DailyRegistrationCount, EventCounts, EventView};

fn map_event_store_error(error: EventStoreError) -> Error {
    match error {
        EventStoreError::Connection { message } => {
            Error::service_unavailable(format!("event store unavailable: {message}"))
        }
        EventStoreError::Query { message } => {
            Error::internal(format!("event store error: {message}"))
        }
    }
}

fn map_registration_store_error(error: RegistrationStoreError) -> Error {
    match error {
        RegistrationStoreError::Connection { message } => {
            Error::service_unavailable(format!("registration store unavailable: {message}"))
        }
        RegistrationStoreError::Query { message } => {
            Error::internal(format!("registration store error: {message}"))
        }
    }
}

fn map_user_directory_error(error: UserDirectoryError) -> Error {
    let UserDirectoryError::Unavailable { message } = error;
    Error::service_unavailable(format!("user directory unavailable: {message}"))
}

/// Round to one decimal place.
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Catalogue service implementing host-facing event operations.
pub struct EventCatalogService {
    events: Arc<dyn EventRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    users: Arc<dyn UserDirectory>,
    ratings: Arc<dyn RatingSource>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl EventCatalogService {
    /// Build the service from its driven ports and clock.
    pub fn new(
        events: Arc<dyn EventRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        users: Arc<dyn UserDirectory>,
        ratings: Arc<dyn RatingSource>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            registrations,
            users,
            ratings,
            notifier,
            clock,
        }
    }

    /// Create a new event owned by `host`.
    pub async fn create_event(&self, host: UserId, draft: EventDraft) -> Result<EventView, Error> {
        let profile = self
            .users
            .find_active(&host)
            .await
            .map_err(map_user_directory_error)?
            .ok_or_else(|| Error::not_found("Host not found"))?;

        let event = Event::create(host, draft, self.clock.utc())
            .map_err(|error| Error::business_rule(error.to_string()))?;
        self.events
            .insert(&event)
            .await
            .map_err(map_event_store_error)?;

        if let Err(error) = self
            .notifier
            .send_event_email(&profile, EmailKind::EventCreated, &event)
            .await
        {
            warn!(host = %host, %error, "event creation email failed");
        }

        info!(event = %event.id, host = %host, "event created");
        self.project(&event, None).await
    }

    /// Update an event's details. Rejected once the event is in a terminal
    /// state; the status is re-derived afterwards so capacity changes flip
    /// `Active`/`Full` immediately.
    pub async fn update_event(
        &self,
        event_id: EventId,
        host: UserId,
        draft: EventDraft,
    ) -> Result<EventView, Error> {
        let mut event = self.load_event(&event_id).await?;
        self.verify_host_ownership(&event, &host).await?;

        if event.is_terminal() {
            return Err(Error::business_rule(
                "Cannot edit a completed or suspended event",
            ));
        }

        event
            .apply(draft, self.clock.utc())
            .map_err(|error| Error::business_rule(error.to_string()))?;

        let registered = self
            .registrations
            .count_by_event_and_status(&event_id, RegistrationStatus::Registered)
            .await
            .map_err(map_registration_store_error)?;
        event.refresh_status(registered);

        self.events
            .update(&event)
            .await
            .map_err(map_event_store_error)?;
        self.project(&event, None).await
    }

    /// Fetch one event with derived figures and the caller's registration
    /// status.
    pub async fn get_event(
        &self,
        event_id: EventId,
        caller: Option<UserId>,
    ) -> Result<EventView, Error> {
        let event = self.load_event(&event_id).await?;
        self.project(&event, caller).await
    }

    /// Host-only roster for an event, newest registration first.
    pub async fn list_attendees(
        &self,
        event_id: EventId,
        host: UserId,
    ) -> Result<Vec<AttendeeView>, Error> {
        let event = self.load_event(&event_id).await?;
        self.verify_host_ownership(&event, &host).await?;

        let rows = self
            .registrations
            .list_by_event(&event_id)
            .await
            .map_err(map_registration_store_error)?;

        let mut attendees = Vec::with_capacity(rows.len());
        for row in rows {
            let profile = self
                .users
                .find_active(&row.user)
                .await
                .map_err(map_user_directory_error)?;
            let (name, email) = profile
                .map(|p| (p.name, Some(p.email)))
                .unwrap_or_else(|| ("Deleted User".to_owned(), None));
            attendees.push(AttendeeView {
                user_id: row.user,
                name,
                email,
                status: row.status,
                registered_at: row.registered_at,
            });
        }
        Ok(attendees)
    }

    /// Host-only analytics: counts, fill percentage, rating summary, and a
    /// daily histogram of confirmed registrations.
    pub async fn get_analytics(
        &self,
        event_id: EventId,
        host: UserId,
    ) -> Result<AnalyticsView, Error> {
        let event = self.load_event(&event_id).await?;
        self.verify_host_ownership(&event, &host).await?;

        let counts = self.counts(&event_id).await?;
        let fill_percentage = if event.max_participants > 0 {
            round_tenths((counts.registered as f64) * 100.0 / f64::from(event.max_participants))
        } else {
            0.0
        };

        let registered_rows = self
            .registrations
            .list_by_event_and_status(&event_id, RegistrationStatus::Registered)
            .await
            .map_err(map_registration_store_error)?;
        let mut buckets: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
        for row in registered_rows {
            *buckets.entry(row.registered_at.date_naive()).or_default() += 1;
        }
        let daily_registration_counts = buckets
            .into_iter()
            .map(|(date, count)| DailyRegistrationCount { date, count })
            .collect();

        let ratings = self.ratings.summary(&event_id).await;
        Ok(AnalyticsView {
            event_id,
            event_title: event.title.clone(),
            total_registrations: counts.registered,
            waitlist_count: counts.waitlisted,
            fill_percentage,
            max_participants: event.max_participants,
            available_seats: counts.available_seats(event.max_participants),
            average_rating: ratings.average,
            rating_count: ratings.count,
            daily_registration_counts,
        })
    }

    /// Move all of `host`'s `Active`/`Full` events to `Suspended`, hiding
    /// them from listings while preserving registration history.
    pub async fn suspend_host_events(&self, host: UserId) -> Result<usize, Error> {
        let mut suspended = 0;
        for status in [EventStatus::Active, EventStatus::Full] {
            let events = self
                .events
                .list_by_host_and_status(&host, status)
                .await
                .map_err(map_event_store_error)?;
            for mut event in events {
                event.status = EventStatus::Suspended;
                self.events
                    .update(&event)
                    .await
                    .map_err(map_event_store_error)?;
                suspended += 1;
            }
        }
        if suspended > 0 {
            info!(host = %host, count = suspended, "suspended host events");
        }
        Ok(suspended)
    }

    /// Nullify the host reference on all of `host`'s events so the account
    /// row can be removed while the events (and everyone else's
    /// registration history) survive.
    pub async fn detach_host(&self, host: UserId) -> Result<usize, Error> {
        self.events
            .detach_host(&host)
            .await
            .map_err(map_event_store_error)
    }

    /// Move every `Active`/`Full` event whose end time has passed to
    /// `Completed`. Driven by the completion sweep; also callable directly.
    pub async fn mark_expired_completed(&self) -> Result<usize, Error> {
        let expired = self
            .events
            .list_expired_active(self.clock.utc())
            .await
            .map_err(map_event_store_error)?;

        let count = expired.len();
        for mut event in expired {
            event.status = EventStatus::Completed;
            self.events
                .update(&event)
                .await
                .map_err(map_event_store_error)?;
        }
        if count > 0 {
            info!(count, "marked events as COMPLETED");
        }
        Ok(count)
    }

    async fn load_event(&self, event_id: &EventId) -> Result<Event, Error> {
        self.events
            .find_by_id(event_id)
            .await
            .map_err(map_event_store_error)?
            .ok_or_else(|| Error::not_found(format!("Event not found with id: {event_id}")))
    }

    /// Ownership check at the domain seam; role-based overrides belong to
    /// the excluded authorization collaborator.
    async fn verify_host_ownership(&self, event: &Event, host: &UserId) -> Result<(), Error> {
        self.users
            .find_active(host)
            .await
            .map_err(map_user_directory_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;
        if event.host.as_ref() != Some(host) {
            return Err(Error::business_rule(
                "You are not authorized to manage this event",
            ));
        }
        Ok(())
    }

    async fn counts(&self, event_id: &EventId) -> Result<EventCounts, Error> {
        let registered = self
            .registrations
            .count_by_event_and_status(event_id, RegistrationStatus::Registered)
            .await
            .map_err(map_registration_store_error)?;
        let waitlisted = self
            .registrations
            .count_by_event_and_status(event_id, RegistrationStatus::Waitlist)
            .await
            .map_err(map_registration_store_error)?;
        Ok(EventCounts {
            registered,
            waitlisted,
        })
    }

    async fn project(&self, event: &Event, caller: Option<UserId>) -> Result<EventView, Error> {
        let counts = self.counts(&event.id).await?;
        let ratings = self.ratings.summary(&event.id).await;
        let caller_status = match caller {
            Some(user) => self
                .registrations
                .find_by_user_and_event(&user, &event.id)
                .await
                .map_err(map_registration_store_error)?
                .map(|row| row.status),
            None => None,
        };
        Ok(EventView::project(event, counts, ratings, caller_status))
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
