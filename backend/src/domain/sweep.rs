//! Periodic sweeps: upcoming-event reminders and completion of ended events.
//!
//! Both sweeps are idempotent single passes; the scheduler drives them on a
//! fixed period and an individual failed pass is logged and retried on the
//! next tick.

use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use tracing::{info, warn};

use super::Error;
use super::catalog::EventCatalogService;
use super::event::{Event, REMINDER_LEAD_HOURS_RANGE, REMINDER_TOLERANCE_MINUTES};
use super::ports::{
    EmailKind, EventRepository, EventStoreError, NotificationSink, RegistrationRepository,
    RegistrationStoreError, UserDirectory,
};
use super::registration::RegistrationStatus;

const REMINDER_TITLE: &str = "Event Reminder ⏰";

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

/// Reminder pass over events whose configured lead window contains "now".
pub struct ReminderSweep {
    events: Arc<dyn EventRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl ReminderSweep {
    /// Build the sweep from its driven ports and clock.
    pub fn new(
        events: Arc<dyn EventRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            registrations,
            users,
            notifier,
            clock,
        }
    }

    /// Run one reminder pass, returning the number of reminders dispatched.
    ///
    /// Candidate events are pre-filtered by start instant: with lead times
    /// capped at 72 hours, only events starting within the next 72 hours
    /// (plus tolerance) can have a window containing `now`. Each candidate is
    /// then checked precisely with [`Event::reminder_due`]. A failed send for
    /// one recipient is logged and the pass moves on.
    pub async fn run_once(&self) -> Result<usize, Error> {
        let now = self.clock.utc();
        let horizon = now
            + Duration::hours(i64::from(*REMINDER_LEAD_HOURS_RANGE.end()))
            + Duration::minutes(REMINDER_TOLERANCE_MINUTES);

        let candidates = self
            .events
            .list_reminder_candidates(now, horizon)
            .await
            .map_err(map_event_store_error)?;

        let mut dispatched = 0;
        for event in candidates {
            if !event.reminder_due(now) {
                continue;
            }
            dispatched += self.remind_attendees(&event).await?;
        }
        if dispatched > 0 {
            info!(count = dispatched, "reminders dispatched");
        }
        Ok(dispatched)
    }

    /// Remind every confirmed attendee of one event. Waitlisted rows hold no
    /// seat and are skipped.
    async fn remind_attendees(&self, event: &Event) -> Result<usize, Error> {
        let rows = self
            .registrations
            .list_by_event_and_status(&event.id, RegistrationStatus::Registered)
            .await
            .map_err(map_registration_store_error)?;

        let mut sent = 0;
        for row in rows {
            let profile = match self.users.find_active(&row.user).await {
                Ok(Some(profile)) => profile,
                Ok(None) => continue,
                Err(error) => {
                    warn!(user = %row.user, %error, "reminder recipient lookup failed");
                    continue;
                }
            };
            if let Err(error) = self
                .notifier
                .send_event_email(&profile, EmailKind::EventReminder, event)
                .await
            {
                warn!(user = %profile.id, event = %event.id, %error, "reminder email failed");
                continue;
            }
            let message = format!("Upcoming event: {}", event.title);
            if let Err(error) = self
                .notifier
                .create_notification(&profile.id, REMINDER_TITLE, &message)
                .await
            {
                warn!(user = %profile.id, %error, "reminder notification failed");
            }
            sent += 1;
        }
        Ok(sent)
    }
}

/// Completion pass delegating to the catalogue's expiry transition.
pub struct CompletionSweep {
    catalog: Arc<EventCatalogService>,
}

impl CompletionSweep {
    /// Build the sweep over the shared catalogue service.
    pub fn new(catalog: Arc<EventCatalogService>) -> Self {
        Self { catalog }
    }

    /// Run one completion pass, returning the number of events completed.
    pub async fn run_once(&self) -> Result<usize, Error> {
        self.catalog.mark_expired_completed().await
    }
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
