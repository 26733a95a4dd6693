use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::error::ErrorCode;
use crate::domain::event::EventStatus;
use crate::outbound::memory::{
    InMemoryEventRepository, InMemoryRegistrationRepository, InMemoryUserDirectory,
};
use crate::test_support::{
    MutableClock, RecordingNotificationSink, baseline, draft, profile,
};

struct Harness {
    events: Arc<InMemoryEventRepository>,
    registrations: Arc<InMemoryRegistrationRepository>,
    users: Arc<InMemoryUserDirectory>,
    sink: Arc<RecordingNotificationSink>,
    clock: Arc<MutableClock>,
    service: Arc<EnrollmentService>,
}

impl Harness {
    fn new() -> Self {
        let events = Arc::new(InMemoryEventRepository::default());
        let registrations = Arc::new(InMemoryRegistrationRepository::default());
        let users = Arc::new(InMemoryUserDirectory::default());
        let sink = Arc::new(RecordingNotificationSink::default());
        let clock = Arc::new(MutableClock::new(baseline()));
        let service = Arc::new(EnrollmentService::new(
            Arc::clone(&events) as Arc<dyn EventRepository>,
            Arc::clone(&registrations) as Arc<dyn RegistrationRepository>,
            Arc::clone(&users) as Arc<dyn UserDirectory>,
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        Self {
            events,
            registrations,
            users,
            sink,
            clock,
            service,
        }
    }

    fn seed_user(&self) -> UserId {
        let id = UserId::random();
        self.users.add(profile(id));
        id
    }

    async fn seed_event(&self, capacity: u32) -> EventId {
        let host = self.seed_user();
        let now = self.clock.utc();
        let event = Event::create(host, draft(now, capacity), now).expect("valid draft");
        self.events.insert(&event).await.expect("insert event");
        event.id
    }

    async fn event(&self, id: EventId) -> Event {
        self.events
            .find_by_id(&id)
            .await
            .expect("store")
            .expect("event exists")
    }

    async fn row(&self, user: UserId, event: EventId) -> Registration {
        self.registrations
            .find_by_user_and_event(&user, &event)
            .await
            .expect("store")
            .expect("row exists")
    }
}

#[rstest]
#[tokio::test]
async fn assigns_seat_while_capacity_remains() {
    let h = Harness::new();
    let event = h.seed_event(2).await;
    let user = h.seed_user();

    let view = h.service.register(event, user).await.expect("register");

    assert_eq!(view.status, RegistrationStatus::Registered);
    assert_eq!(view.event_title, "Rust Meetup");
    assert_eq!(h.event(event).await.status, EventStatus::Active);
    let confirmations = h
        .sink
        .emails_of_kind(EmailKind::RegistrationConfirmation);
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].recipient, user);
}

#[rstest]
#[tokio::test]
async fn waitlists_once_capacity_reached_and_marks_event_full() {
    let h = Harness::new();
    let event = h.seed_event(2).await;

    for _ in 0..2 {
        let user = h.seed_user();
        let view = h.service.register(event, user).await.expect("register");
        assert_eq!(view.status, RegistrationStatus::Registered);
    }
    let late = h.seed_user();
    let view = h.service.register(event, late).await.expect("register");

    assert_eq!(view.status, RegistrationStatus::Waitlist);
    assert_eq!(h.event(event).await.status, EventStatus::Full);
    assert_eq!(
        h.sink.emails_of_kind(EmailKind::WaitlistConfirmation).len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn rejects_duplicate_live_registration() {
    let h = Harness::new();
    let event = h.seed_event(5).await;
    let user = h.seed_user();
    h.service.register(event, user).await.expect("register");

    let error = h.service.register(event, user).await.expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::BusinessRule);
    assert_eq!(
        error.message(),
        "You are already registered or on waitlist for this event"
    );
}

#[rstest]
#[tokio::test]
async fn rejects_registration_after_deadline() {
    let h = Harness::new();
    let event = h.seed_event(5).await;
    let user = h.seed_user();

    // Deadline is one day out; jump just past it.
    h.clock.advance_minutes(24 * 60 + 1);
    let error = h.service.register(event, user).await.expect_err("deadline");

    assert_eq!(error.code(), ErrorCode::BusinessRule);
    assert_eq!(error.message(), "Registration deadline has passed");
}

#[rstest]
#[case(EventStatus::Suspended)]
#[case(EventStatus::Completed)]
#[tokio::test]
async fn rejects_registration_for_terminal_event(#[case] status: EventStatus) {
    let h = Harness::new();
    let event_id = h.seed_event(5).await;
    let mut event = h.event(event_id).await;
    event.status = status;
    h.events.update(&event).await.expect("update");

    let user = h.seed_user();
    let error = h.service.register(event_id, user).await.expect_err("terminal");

    assert_eq!(error.code(), ErrorCode::BusinessRule);
    assert_eq!(error.message(), "Cannot register for this event");
}

#[rstest]
#[tokio::test]
async fn rejects_unknown_user() {
    let h = Harness::new();
    let event = h.seed_event(5).await;

    let error = h
        .service
        .register(event, UserId::random())
        .await
        .expect_err("missing user");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn cancellation_promotes_longest_waiting_entrant() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    let seated = h.seed_user();
    let first_in_line = h.seed_user();
    let second_in_line = h.seed_user();

    h.service.register(event, seated).await.expect("register");
    h.clock.advance_minutes(1);
    h.service
        .register(event, first_in_line)
        .await
        .expect("register");
    h.clock.advance_minutes(1);
    h.service
        .register(event, second_in_line)
        .await
        .expect("register");

    h.service.cancel(event, seated).await.expect("cancel");

    assert_eq!(
        h.row(first_in_line, event).await.status,
        RegistrationStatus::Registered
    );
    assert_eq!(
        h.row(second_in_line, event).await.status,
        RegistrationStatus::Waitlist
    );
    assert_eq!(
        h.row(seated, event).await.status,
        RegistrationStatus::Cancelled
    );
    // One seat, one promotion: the event stays full.
    assert_eq!(h.event(event).await.status, EventStatus::Full);
    assert_eq!(
        h.sink.emails_of_kind(EmailKind::WaitlistPromotion).len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn cancelling_a_waitlist_spot_promotes_nobody() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    let seated = h.seed_user();
    let waiting = h.seed_user();

    h.service.register(event, seated).await.expect("register");
    h.clock.advance_minutes(1);
    h.service.register(event, waiting).await.expect("register");

    h.service.cancel(event, waiting).await.expect("cancel");

    assert_eq!(
        h.row(seated, event).await.status,
        RegistrationStatus::Registered
    );
    assert!(h.sink.emails_of_kind(EmailKind::WaitlistPromotion).is_empty());
    // The freed queue slot reopens nothing; the seat was never released.
    assert_eq!(h.event(event).await.status, EventStatus::Full);
}

#[rstest]
#[tokio::test]
async fn rejects_cancellation_after_event_start() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    let user = h.seed_user();
    h.service.register(event, user).await.expect("register");

    h.clock.advance_minutes(3 * 24 * 60);
    let error = h.service.cancel(event, user).await.expect_err("too late");

    assert_eq!(error.code(), ErrorCode::BusinessRule);
    assert_eq!(
        error.message(),
        "Cannot cancel registration after event has started"
    );
}

#[rstest]
#[tokio::test]
async fn rejects_cancelling_missing_or_cancelled_rows() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    let user = h.seed_user();

    let missing = h.service.cancel(event, user).await.expect_err("no row");
    assert_eq!(missing.code(), ErrorCode::NotFound);

    h.service.register(event, user).await.expect("register");
    h.service.cancel(event, user).await.expect("cancel");
    let again = h.service.cancel(event, user).await.expect_err("twice");
    assert_eq!(again.code(), ErrorCode::BusinessRule);
    assert_eq!(again.message(), "Registration is already cancelled");
}

#[rstest]
#[tokio::test]
async fn reregistration_joins_the_back_of_the_queue() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    let seated = h.seed_user();
    let returning = h.seed_user();
    let newcomer = h.seed_user();

    h.service.register(event, seated).await.expect("register");
    h.clock.advance_minutes(1);
    h.service.register(event, returning).await.expect("register");
    h.service.cancel(event, returning).await.expect("cancel");
    h.clock.advance_minutes(1);
    h.service.register(event, newcomer).await.expect("register");
    h.clock.advance_minutes(1);
    h.service.register(event, returning).await.expect("re-register");

    // The returning user's old queue position is gone; their fresh row
    // timestamps behind the newcomer's.
    h.service.cancel(event, seated).await.expect("cancel");

    assert_eq!(
        h.row(newcomer, event).await.status,
        RegistrationStatus::Registered
    );
    assert_eq!(
        h.row(returning, event).await.status,
        RegistrationStatus::Waitlist
    );
}

#[rstest]
#[tokio::test]
async fn notification_failure_never_aborts_registration() {
    let h = Harness::new();
    let event = h.seed_event(5).await;
    let user = h.seed_user();
    h.sink.fail_for(user);

    let view = h.service.register(event, user).await.expect("register");

    assert_eq!(view.status, RegistrationStatus::Registered);
    assert!(h.sink.emails().is_empty());
}

#[rstest]
#[tokio::test]
async fn promote_from_waitlist_fills_at_most_one_seat() {
    let h = Harness::new();
    let event = h.seed_event(2).await;
    let leaver = h.seed_user();
    h.service.register(event, leaver).await.expect("register");
    for _ in 0..3 {
        h.clock.advance_minutes(1);
        let user = h.seed_user();
        h.service.register(event, user).await.expect("register");
    }

    h.service.cancel(event, leaver).await.expect("cancel");

    let registered = h
        .registrations
        .count_by_event_and_status(&event, RegistrationStatus::Registered)
        .await
        .expect("count");
    let waitlisted = h
        .registrations
        .count_by_event_and_status(&event, RegistrationStatus::Waitlist)
        .await
        .expect("count");
    assert_eq!(registered, 2);
    assert_eq!(waitlisted, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_never_exceed_capacity() {
    let h = Harness::new();
    let event = h.seed_event(3).await;
    let users: Vec<UserId> = (0..16).map(|_| h.seed_user()).collect();

    let mut handles = Vec::new();
    for user in users {
        let service = Arc::clone(&h.service);
        handles.push(tokio::spawn(
            async move { service.register(event, user).await },
        ));
    }
    for handle in handles {
        handle.await.expect("task").expect("register");
    }

    let registered = h
        .registrations
        .count_by_event_and_status(&event, RegistrationStatus::Registered)
        .await
        .expect("count");
    let waitlisted = h
        .registrations
        .count_by_event_and_status(&event, RegistrationStatus::Waitlist)
        .await
        .expect("count");
    assert_eq!(registered, 3);
    assert_eq!(waitlisted, 13);
    assert_eq!(h.event(event).await.status, EventStatus::Full);
}

#[rstest]
#[tokio::test]
async fn offboarding_cancellation_promotes_per_event() {
    let h = Harness::new();
    let leaver = h.seed_user();
    let first = h.seed_event(1).await;
    let second = h.seed_event(1).await;
    h.service.register(first, leaver).await.expect("register");
    h.service.register(second, leaver).await.expect("register");

    h.clock.advance_minutes(1);
    let waiting = h.seed_user();
    h.service.register(first, waiting).await.expect("register");

    let cancelled = h
        .service
        .cancel_active_registrations(leaver)
        .await
        .expect("cascade");

    assert_eq!(cancelled, 2);
    assert_eq!(
        h.row(waiting, first).await.status,
        RegistrationStatus::Registered
    );
    assert_eq!(h.event(second).await.status, EventStatus::Active);
}
