//! Ranked read model for event listings.
//!
//! Ordering is a pure sort-key function rather than a dynamically built
//! query: every event maps to a tuple and the listing sorts by it. The
//! composite is, in priority order: phase bucket ascending, the caller's
//! active registrations first within a bucket, soonest-first for
//! non-completed buckets, most-recently-finished-first for the completed
//! bucket.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Deserialize;

use super::Error;
use super::event::{Event, EventPhase, EventStatus};
use super::ids::{EventId, UserId};
use super::ports::{
    EventRepository, EventStoreError, RatingSource, RegistrationRepository,
    RegistrationStoreError,
};
use super::registration::RegistrationStatus;
use super::views::{EventCounts, EventView};

/// Default listing page size.
pub const DEFAULT_PAGE_SIZE: usize = 20;

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

/// Caller-supplied listing filter. Suspended events are always excluded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilter {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Restrict to events still accepting registrations (status `Active`).
    pub available: bool,
    /// Inclusive lower bound on `event_date`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `event_date`.
    pub date_to: Option<DateTime<Utc>>,
    /// Zero-based page index.
    pub page: usize,
    /// Page size; zero falls back to [`DEFAULT_PAGE_SIZE`].
    pub size: usize,
}

impl EventFilter {
    fn matches(&self, event: &Event) -> bool {
        if event.status == EventStatus::Suspended {
            return false;
        }
        if let Some(search) = &self.search
            && !search.trim().is_empty()
            && !event.title.to_lowercase().contains(&search.to_lowercase())
        {
            return false;
        }
        if let Some(category) = &self.category
            && !category.trim().is_empty()
            && &event.category != category
        {
            return false;
        }
        if self.available && event.status != EventStatus::Active {
            return false;
        }
        if let Some(from) = self.date_from
            && event.event_date < from
        {
            return false;
        }
        if let Some(to) = self.date_to
            && event.event_date > to
        {
            return false;
        }
        true
    }

    fn page_size(&self) -> usize {
        if self.size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.size
        }
    }
}

/// Composite sort key for one event. Tuple ordering reproduces the
/// four-priority listing order exactly.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use eventhub_backend::domain::listing::sort_key;
/// use eventhub_backend::domain::{Event, EventDraft, UserId};
///
/// let now = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).single().expect("valid time");
/// let draft = EventDraft {
///     title: "Demo".into(),
///     description: String::new(),
///     venue: "Hall".into(),
///     category: "tech".into(),
///     event_date: now + chrono::Duration::days(2),
///     event_end_time: None,
///     registration_deadline: now + chrono::Duration::days(1),
///     max_participants: 10,
///     reminder_lead_hours: None,
/// };
/// let event = Event::create(UserId::random(), draft, now).expect("valid draft");
/// let key = sort_key(&event, now, false);
/// assert_eq!(key.0, 0); // open phase
/// ```
pub fn sort_key(event: &Event, now: DateTime<Utc>, caller_registered: bool) -> (u8, u8, i64, i64) {
    let phase = match event.phase(now) {
        EventPhase::Open => 0,
        EventPhase::RegistrationClosed => 1,
        EventPhase::Completed => 2,
    };
    let completed = event.status == EventStatus::Completed;
    // The registration boost only applies while the event is live; once it
    // completes the entry falls back to plain date ordering.
    let registered_rank = u8::from(!(caller_registered && !completed));
    let date_asc = if completed {
        0
    } else {
        event.event_date.timestamp()
    };
    let date_desc = if completed {
        -event.event_date.timestamp()
    } else {
        0
    };
    (phase, registered_rank, date_asc, date_desc)
}

/// Read-only listing service.
pub struct EventListingService {
    events: Arc<dyn EventRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    ratings: Arc<dyn RatingSource>,
    clock: Arc<dyn Clock>,
}

impl EventListingService {
    /// Build the service from its driven ports and clock.
    pub fn new(
        events: Arc<dyn EventRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        ratings: Arc<dyn RatingSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            registrations,
            ratings,
            clock,
        }
    }

    /// Produce the filtered, ranked, paginated listing for `caller`.
    pub async fn list_events(
        &self,
        filter: &EventFilter,
        caller: Option<UserId>,
    ) -> Result<Vec<EventView>, Error> {
        let now = self.clock.utc();
        let mut events: Vec<Event> = self
            .events
            .list_all()
            .await
            .map_err(map_event_store_error)?
            .into_iter()
            .filter(|event| filter.matches(event))
            .collect();

        let registered_set = self.caller_registered_set(caller.as_ref()).await?;
        events.sort_by_key(|event| sort_key(event, now, registered_set.contains(&event.id)));

        let size = filter.page_size();
        let page = events
            .into_iter()
            .skip(filter.page.saturating_mul(size))
            .take(size);

        let mut views = Vec::new();
        for event in page {
            views.push(self.project(&event, caller.as_ref()).await?);
        }
        Ok(views)
    }

    async fn caller_registered_set(
        &self,
        caller: Option<&UserId>,
    ) -> Result<HashSet<EventId>, Error> {
        let Some(user) = caller else {
            return Ok(HashSet::new());
        };
        let rows = self
            .registrations
            .list_by_user_and_status(user, RegistrationStatus::Registered)
            .await
            .map_err(map_registration_store_error)?;
        Ok(rows.into_iter().map(|row| row.event).collect())
    }

    async fn project(&self, event: &Event, caller: Option<&UserId>) -> Result<EventView, Error> {
        let registered = self
            .registrations
            .count_by_event_and_status(&event.id, RegistrationStatus::Registered)
            .await
            .map_err(map_registration_store_error)?;
        let waitlisted = self
            .registrations
            .count_by_event_and_status(&event.id, RegistrationStatus::Waitlist)
            .await
            .map_err(map_registration_store_error)?;
        let ratings = self.ratings.summary(&event.id).await;
        let caller_status = match caller {
            Some(user) => self
                .registrations
                .find_by_user_and_event(user, &event.id)
                .await
                .map_err(map_registration_store_error)?
                .map(|row| row.status),
            None => None,
        };
        Ok(EventView::project(
            event,
            EventCounts {
                registered,
                waitlisted,
            },
            ratings,
            caller_status,
        ))
    }
}

#[cfg(test)]
#[path = "listing_tests.rs"]
mod tests;
