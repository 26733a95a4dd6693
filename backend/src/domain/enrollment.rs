//! Enrollment engine: capacity allocation, cancellation, and waitlist
//! promotion.
//!
//! All mutating sequences on one event are serialized through a per-event
//! async lock, so the count-then-assign step cannot overshoot capacity under
//! concurrent registrations, and promotion always reads the registered count
//! after the freeing cancellation has been persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mockable::Clock;
use tracing::{info, warn};

use super::Error;
use super::event::Event;
use super::ids::{EventId, UserId};
use super::ports::{
    EmailKind, EventRepository, EventStoreError, NotificationSink, RegistrationRepository,
    RegistrationStoreError, UserDirectory, UserDirectoryError, UserProfile,
};
use super::registration::{Registration, RegistrationStatus};
use super::views::RegistrationView;

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

/// Registry of per-event async locks.
///
/// The lock for an event is held across every count-read/row-write sequence
/// touching that event, standing in for the serializable per-event
/// transaction a relational store would provide.
#[derive(Default)]
pub struct EventLocks {
    inner: Mutex<HashMap<EventId, Arc<tokio::sync::Mutex<()>>>>,
}

impl EventLocks {
    /// Acquire the lock for `event`, creating it on first use.
    pub async fn acquire(&self, event: EventId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut guard = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(guard.entry(event).or_default())
        };
        lock.lock_owned().await
    }
}

/// Outcome-specific notification copy for a fresh registration.
const CONFIRMED_TITLE: &str = "Registration Confirmed ✅";
const WAITLIST_TITLE: &str = "Added to Waitlist ⏳";
const PROMOTION_TITLE: &str = "You got a spot! 🎊";

/// Capacity allocator and waitlist promoter.
pub struct EnrollmentService {
    events: Arc<dyn EventRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    locks: EventLocks,
}

impl EnrollmentService {
    /// Build the service from its driven ports and clock.
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
            locks: EventLocks::default(),
        }
    }

    /// Register `user` for `event_id`, assigning a seat when capacity
    /// allows and a waitlist slot otherwise.
    ///
    /// A cancelled row for the pair is deleted and replaced so the fresh
    /// `registered_at` places the user at the back of any queue.
    pub async fn register(
        &self,
        event_id: EventId,
        user: UserId,
    ) -> Result<RegistrationView, Error> {
        let _guard = self.locks.acquire(event_id).await;

        let mut event = self.load_event(&event_id).await?;
        let profile = self
            .users
            .find_active(&user)
            .await
            .map_err(map_user_directory_error)?
            .ok_or_else(|| Error::not_found(format!("user {user} not found")))?;

        if event.is_terminal() {
            return Err(Error::business_rule("Cannot register for this event"));
        }
        if self.clock.utc() > event.registration_deadline {
            return Err(Error::business_rule("Registration deadline has passed"));
        }

        if let Some(existing) = self
            .registrations
            .find_by_user_and_event(&user, &event_id)
            .await
            .map_err(map_registration_store_error)?
        {
            if existing.status.is_live() {
                return Err(Error::business_rule(
                    "You are already registered or on waitlist for this event",
                ));
            }
            // Replace rather than revive, so registered_at reflects this
            // attempt and any previous queue position is lost.
            self.registrations
                .delete(&existing.id)
                .await
                .map_err(map_registration_store_error)?;
        }

        let registered = self.registered_count(&event_id).await?;
        let status = if registered < u64::from(event.max_participants) {
            RegistrationStatus::Registered
        } else {
            RegistrationStatus::Waitlist
        };

        let registration = Registration::new(user, event_id, status, self.clock.utc());
        self.registrations
            .insert(&registration)
            .await
            .map_err(map_registration_store_error)?;

        self.notify_registration_outcome(&profile, &event, status)
            .await;
        self.refresh_event_status(&mut event).await?;

        info!(
            event = %event_id,
            user = %user,
            status = ?status,
            "registration recorded"
        );
        Ok(RegistrationView::project(&registration, &event.title))
    }

    /// Cancel `user`'s live registration for `event_id`. Freeing a
    /// confirmed seat triggers one waitlist promotion.
    pub async fn cancel(&self, event_id: EventId, user: UserId) -> Result<(), Error> {
        let _guard = self.locks.acquire(event_id).await;

        let mut event = self.load_event(&event_id).await?;
        if self.clock.utc() > event.event_date {
            return Err(Error::business_rule(
                "Cannot cancel registration after event has started",
            ));
        }

        let mut registration = self
            .registrations
            .find_by_user_and_event(&user, &event_id)
            .await
            .map_err(map_registration_store_error)?
            .ok_or_else(|| Error::not_found("Registration not found"))?;

        if registration.status == RegistrationStatus::Cancelled {
            return Err(Error::business_rule("Registration is already cancelled"));
        }

        let was_registered = registration.status == RegistrationStatus::Registered;
        registration.status = RegistrationStatus::Cancelled;
        self.registrations
            .update(&registration)
            .await
            .map_err(map_registration_store_error)?;

        if was_registered {
            self.promote_locked(&event).await?;
        }
        self.refresh_event_status(&mut event).await?;

        info!(event = %event_id, user = %user, "registration cancelled");
        Ok(())
    }

    /// Promote the longest-waiting entrant for `event_id` if a seat is
    /// free. At most one promotion per invocation.
    pub async fn promote_from_waitlist(&self, event_id: EventId) -> Result<(), Error> {
        let _guard = self.locks.acquire(event_id).await;
        let mut event = self.load_event(&event_id).await?;
        self.promote_locked(&event).await?;
        self.refresh_event_status(&mut event).await
    }

    /// Cancel every confirmed registration `user` holds, promoting from
    /// each affected waitlist. Part of the account offboarding cascade.
    pub async fn cancel_active_registrations(&self, user: UserId) -> Result<usize, Error> {
        let rows = self
            .registrations
            .list_by_user_and_status(&user, RegistrationStatus::Registered)
            .await
            .map_err(map_registration_store_error)?;

        let mut cancelled = 0;
        for row in rows {
            let _guard = self.locks.acquire(row.event).await;
            let mut registration = row;
            registration.status = RegistrationStatus::Cancelled;
            self.registrations
                .update(&registration)
                .await
                .map_err(map_registration_store_error)?;
            cancelled += 1;

            match self.load_event(&registration.event).await {
                Ok(mut event) => {
                    self.promote_locked(&event).await?;
                    self.refresh_event_status(&mut event).await?;
                }
                // The event vanished underneath the row; nothing to promote.
                Err(error) => warn!(
                    event = %registration.event,
                    %error,
                    "skipping promotion for missing event during offboarding"
                ),
            }
        }
        Ok(cancelled)
    }

    async fn load_event(&self, event_id: &EventId) -> Result<Event, Error> {
        self.events
            .find_by_id(event_id)
            .await
            .map_err(map_event_store_error)?
            .ok_or_else(|| Error::not_found(format!("Event not found with id: {event_id}")))
    }

    async fn registered_count(&self, event_id: &EventId) -> Result<u64, Error> {
        self.registrations
            .count_by_event_and_status(event_id, RegistrationStatus::Registered)
            .await
            .map_err(map_registration_store_error)
    }

    /// Promote exactly the earliest waitlist entry when capacity allows.
    /// Callers must hold the event lock.
    async fn promote_locked(&self, event: &Event) -> Result<(), Error> {
        let waitlist = self
            .registrations
            .list_waitlist_fifo(&event.id)
            .await
            .map_err(map_registration_store_error)?;
        let registered = self.registered_count(&event.id).await?;

        if registered >= u64::from(event.max_participants) {
            return Ok(());
        }
        let Some(mut next) = waitlist.into_iter().next() else {
            return Ok(());
        };

        next.status = RegistrationStatus::Registered;
        self.registrations
            .update(&next)
            .await
            .map_err(map_registration_store_error)?;

        self.notify_promotion(&next.user, event).await;
        info!(event = %event.id, user = %next.user, "promoted from waitlist");
        Ok(())
    }

    async fn refresh_event_status(&self, event: &mut Event) -> Result<(), Error> {
        let registered = self.registered_count(&event.id).await?;
        event.refresh_status(registered);
        self.events
            .update(event)
            .await
            .map_err(map_event_store_error)
    }

    /// Notification dispatch is decoupled from the transactional outcome: a
    /// failed send is logged and never rolls back the registration.
    async fn notify_registration_outcome(
        &self,
        profile: &UserProfile,
        event: &Event,
        status: RegistrationStatus,
    ) {
        let (kind, title, message) = if status == RegistrationStatus::Registered {
            (
                EmailKind::RegistrationConfirmation,
                CONFIRMED_TITLE,
                format!("You're registered for: {}", event.title),
            )
        } else {
            (
                EmailKind::WaitlistConfirmation,
                WAITLIST_TITLE,
                format!("You're on the waitlist for: {}", event.title),
            )
        };

        if let Err(error) = self.notifier.send_event_email(profile, kind, event).await {
            warn!(user = %profile.id, %error, "registration email failed");
        }
        if let Err(error) = self
            .notifier
            .create_notification(&profile.id, title, &message)
            .await
        {
            warn!(user = %profile.id, %error, "registration notification failed");
        }
    }

    async fn notify_promotion(&self, user: &UserId, event: &Event) {
        match self.users.find_active(user).await {
            Ok(Some(profile)) => {
                if let Err(error) = self
                    .notifier
                    .send_event_email(&profile, EmailKind::WaitlistPromotion, event)
                    .await
                {
                    warn!(user = %profile.id, %error, "promotion email failed");
                }
            }
            Ok(None) => {}
            Err(error) => warn!(%user, %error, "promotion recipient lookup failed"),
        }
        let message = format!("You've been promoted from the waitlist for: {}", event.title);
        if let Err(error) = self
            .notifier
            .create_notification(user, PROMOTION_TITLE, &message)
            .await
        {
            warn!(%user, %error, "promotion notification failed");
        }
    }
}

#[cfg(test)]
#[path = "enrollment_tests.rs"]
mod tests;
