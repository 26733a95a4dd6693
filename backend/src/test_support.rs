//! Shared test doubles for the backend crate.
//!
//! Compiled for unit tests and, behind the `test-support` feature, for
//! integration tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::event::{Event, EventDraft};
use crate::domain::ids::{EventId, UserId};
use crate::domain::ports::{
    EmailKind, NotificationError, NotificationSink, RatingSource, RatingSummary, UserProfile,
};

/// Clock whose reading tests can move forward.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}",)
            }
        };
        *self.lock_clock() += delta;
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.lock_clock() += TimeDelta::minutes(minutes);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// One recorded in-app notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotification {
    pub user: UserId,
    pub title: String,
    pub message: String,
}

/// One recorded outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEmail {
    pub recipient: UserId,
    pub kind: EmailKind,
    pub event: EventId,
}

/// Sink that records every notification and can be told to fail for
/// specific recipients, for exercising the fire-and-forget contract.
#[derive(Default)]
pub struct RecordingNotificationSink {
    notifications: Mutex<Vec<RecordedNotification>>,
    emails: Mutex<Vec<RecordedEmail>>,
    failing: Mutex<HashSet<UserId>>,
}

impl RecordingNotificationSink {
    pub fn fail_for(&self, user: UserId) {
        lock(&self.failing).insert(user);
    }

    pub fn notifications(&self) -> Vec<RecordedNotification> {
        lock(&self.notifications).clone()
    }

    pub fn emails(&self) -> Vec<RecordedEmail> {
        lock(&self.emails).clone()
    }

    pub fn emails_of_kind(&self, kind: EmailKind) -> Vec<RecordedEmail> {
        lock(&self.emails)
            .iter()
            .filter(|email| email.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn create_notification(
        &self,
        user: &UserId,
        title: &str,
        message: &str,
    ) -> Result<(), NotificationError> {
        if lock(&self.failing).contains(user) {
            return Err(NotificationError::send("injected failure"));
        }
        lock(&self.notifications).push(RecordedNotification {
            user: *user,
            title: title.to_owned(),
            message: message.to_owned(),
        });
        Ok(())
    }

    async fn send_event_email(
        &self,
        recipient: &UserProfile,
        kind: EmailKind,
        event: &Event,
    ) -> Result<(), NotificationError> {
        if lock(&self.failing).contains(&recipient.id) {
            return Err(NotificationError::send("injected failure"));
        }
        lock(&self.emails).push(RecordedEmail {
            recipient: recipient.id,
            kind,
            event: event.id,
        });
        Ok(())
    }
}

/// Rating source returning one fixed summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRatings(pub RatingSummary);

#[async_trait]
impl RatingSource for StaticRatings {
    async fn summary(&self, _event: &EventId) -> RatingSummary {
        self.0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("test sink mutex"),
    }
}

/// Fixed baseline instant used across behaviour tests.
pub fn baseline() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).single() {
        Some(instant) => instant,
        None => panic!("baseline instant"),
    }
}

/// Draft for an event starting two days after `now` with a one-day
/// registration window.
pub fn draft(now: DateTime<Utc>, capacity: u32) -> EventDraft {
    EventDraft {
        title: "Rust Meetup".to_owned(),
        description: "Monthly meetup".to_owned(),
        venue: "Main Hall".to_owned(),
        category: "tech".to_owned(),
        event_date: now + TimeDelta::days(2),
        event_end_time: None,
        registration_deadline: now + TimeDelta::days(1),
        max_participants: capacity,
        reminder_lead_hours: None,
    }
}

/// Profile for a fresh user with a derived name and address.
pub fn profile(id: UserId) -> UserProfile {
    UserProfile {
        name: format!("user-{id}"),
        email: format!("{id}@example.com"),
        id,
    }
}
