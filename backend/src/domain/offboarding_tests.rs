use std::sync::Arc;

use mockable::Clock;
use rstest::rstest;

use super::*;
use crate::domain::enrollment::EnrollmentService;
use crate::domain::event::EventStatus;
use crate::domain::ids::EventId;
use crate::domain::ports::{
    EventRepository, NotificationSink, RatingSource, RatingSummary, UserDirectory,
};
use crate::domain::registration::RegistrationStatus;
use crate::outbound::memory::{
    InMemoryEventRepository, InMemoryRegistrationRepository, InMemoryUserDirectory,
};
use crate::test_support::{
    MutableClock, RecordingNotificationSink, StaticRatings, baseline, draft, profile,
};

struct Harness {
    events: Arc<InMemoryEventRepository>,
    registrations: Arc<InMemoryRegistrationRepository>,
    users: Arc<InMemoryUserDirectory>,
    clock: Arc<MutableClock>,
    enrollment: Arc<EnrollmentService>,
    catalog: Arc<EventCatalogService>,
    service: OffboardingService,
}

impl Harness {
    fn new() -> Self {
        let events = Arc::new(InMemoryEventRepository::default());
        let registrations = Arc::new(InMemoryRegistrationRepository::default());
        let users = Arc::new(InMemoryUserDirectory::default());
        let sink = Arc::new(RecordingNotificationSink::default());
        let clock = Arc::new(MutableClock::new(baseline()));
        let enrollment = Arc::new(EnrollmentService::new(
            Arc::clone(&events) as Arc<dyn EventRepository>,
            Arc::clone(&registrations) as Arc<dyn RegistrationRepository>,
            Arc::clone(&users) as Arc<dyn UserDirectory>,
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let catalog = Arc::new(EventCatalogService::new(
            Arc::clone(&events) as Arc<dyn EventRepository>,
            Arc::clone(&registrations) as Arc<dyn RegistrationRepository>,
            Arc::clone(&users) as Arc<dyn UserDirectory>,
            Arc::new(StaticRatings(RatingSummary::default())) as Arc<dyn RatingSource>,
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let service = OffboardingService::new(
            Arc::clone(&enrollment),
            Arc::clone(&catalog),
            Arc::clone(&registrations) as Arc<dyn RegistrationRepository>,
        );
        Self {
            events,
            registrations,
            users,
            clock,
            enrollment,
            catalog,
            service,
        }
    }

    fn seed_user(&self) -> UserId {
        let id = UserId::random();
        self.users.add(profile(id));
        id
    }

    async fn seed_event(&self, host: UserId, capacity: u32) -> EventId {
        let view = self
            .catalog
            .create_event(host, draft(self.clock.utc(), capacity))
            .await
            .expect("create event");
        view.id
    }
}

#[rstest]
#[tokio::test]
async fn retirement_cascades_in_order() {
    let h = Harness::new();
    let leaver = h.seed_user();
    let other_host = h.seed_user();

    // The leaver hosts an event that someone else attends.
    let hosted = h.seed_event(leaver, 5).await;
    let attendee = h.seed_user();
    h.enrollment
        .register(hosted, attendee)
        .await
        .expect("register");

    // The leaver holds the only seat of another host's event, with a queue.
    let attended = h.seed_event(other_host, 1).await;
    h.enrollment
        .register(attended, leaver)
        .await
        .expect("register");
    h.clock.advance_minutes(1);
    let waiting = h.seed_user();
    h.enrollment
        .register(attended, waiting)
        .await
        .expect("register");

    let report = h.service.retire_user(leaver).await.expect("retire");

    assert_eq!(
        report,
        RetirementReport {
            registrations_cancelled: 1,
            events_suspended: 1,
            events_detached: 1,
            rows_purged: 1,
        }
    );

    // The freed seat went to the queue before the leaver's rows were purged.
    let promoted = h
        .registrations
        .find_by_user_and_event(&waiting, &attended)
        .await
        .expect("store")
        .expect("row exists");
    assert_eq!(promoted.status, RegistrationStatus::Registered);

    // The hosted event survives suspended and detached, with its roster.
    let hosted_event = h
        .events
        .find_by_id(&hosted)
        .await
        .expect("store")
        .expect("event exists");
    assert_eq!(hosted_event.status, EventStatus::Suspended);
    assert_eq!(hosted_event.host, None);
    assert!(
        h.registrations
            .find_by_user_and_event(&attendee, &hosted)
            .await
            .expect("store")
            .is_some()
    );

    // The leaver's own rows are gone.
    assert!(
        h.registrations
            .find_by_user_and_event(&leaver, &attended)
            .await
            .expect("store")
            .is_none()
    );
}

#[rstest]
#[tokio::test]
async fn retiring_a_user_with_no_footprint_reports_zeroes() {
    let h = Harness::new();
    let user = h.seed_user();

    let report = h.service.retire_user(user).await.expect("retire");

    assert_eq!(report, RetirementReport::default());
}
