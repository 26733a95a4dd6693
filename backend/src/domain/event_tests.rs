use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ids::UserId;

#[fixture]
fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

fn draft(now: chrono::DateTime<Utc>) -> EventDraft {
    EventDraft {
        title: "Rust Meetup".to_owned(),
        description: "Monthly meetup".to_owned(),
        venue: "Main Hall".to_owned(),
        category: "tech".to_owned(),
        event_date: now + Duration::days(2),
        event_end_time: None,
        registration_deadline: now + Duration::days(1),
        max_participants: 10,
        reminder_lead_hours: None,
    }
}

#[rstest]
fn create_defaults_end_time_to_two_hours(now: chrono::DateTime<Utc>) {
    let event = Event::create(UserId::random(), draft(now), now).expect("valid draft");
    assert_eq!(
        event.event_end_time,
        event.event_date + Duration::hours(DEFAULT_DURATION_HOURS)
    );
    assert_eq!(event.status, EventStatus::Active);
}

#[rstest]
fn create_keeps_explicit_end_time(now: chrono::DateTime<Utc>) {
    let mut d = draft(now);
    d.event_end_time = Some(d.event_date + Duration::hours(5));
    let event = Event::create(UserId::random(), d, now).expect("valid draft");
    assert_eq!(event.event_end_time, event.event_date + Duration::hours(5));
}

#[rstest]
fn rejects_deadline_at_or_after_start(now: chrono::DateTime<Utc>) {
    let mut d = draft(now);
    d.registration_deadline = d.event_date;
    assert_eq!(
        Event::create(UserId::random(), d, now),
        Err(EventValidationError::DeadlineNotBeforeStart)
    );
}

#[rstest]
fn rejects_zero_capacity(now: chrono::DateTime<Utc>) {
    let mut d = draft(now);
    d.max_participants = 0;
    assert_eq!(
        Event::create(UserId::random(), d, now),
        Err(EventValidationError::ZeroCapacity)
    );
}

#[rstest]
#[case(0)]
#[case(73)]
fn rejects_reminder_lead_outside_range(now: chrono::DateTime<Utc>, #[case] lead: u32) {
    let mut d = draft(now);
    d.reminder_lead_hours = Some(lead);
    assert_eq!(
        Event::create(UserId::random(), d, now),
        Err(EventValidationError::ReminderLeadOutOfRange)
    );
}

#[rstest]
#[case(1)]
#[case(72)]
fn accepts_reminder_lead_at_bounds(now: chrono::DateTime<Utc>, #[case] lead: u32) {
    let mut d = draft(now);
    d.reminder_lead_hours = Some(lead);
    assert!(Event::create(UserId::random(), d, now).is_ok());
}

#[rstest]
fn rejects_end_before_start(now: chrono::DateTime<Utc>) {
    let mut d = draft(now);
    d.event_end_time = Some(d.event_date - Duration::minutes(1));
    assert_eq!(
        Event::create(UserId::random(), d, now),
        Err(EventValidationError::EndBeforeStart)
    );
}

#[rstest]
fn refresh_status_flips_between_active_and_full(now: chrono::DateTime<Utc>) {
    let mut d = draft(now);
    d.max_participants = 3;
    let mut event = Event::create(UserId::random(), d, now).expect("valid draft");

    event.refresh_status(3);
    assert_eq!(event.status, EventStatus::Full);
    event.refresh_status(2);
    assert_eq!(event.status, EventStatus::Active);
}

#[rstest]
#[case(EventStatus::Suspended)]
#[case(EventStatus::Completed)]
fn terminal_states_absorb_count_changes(now: chrono::DateTime<Utc>, #[case] status: EventStatus) {
    let mut event = Event::create(UserId::random(), draft(now), now).expect("valid draft");
    event.status = status;

    event.refresh_status(0);
    assert_eq!(event.status, status);
    event.refresh_status(u64::from(event.max_participants));
    assert_eq!(event.status, status);
    assert!(event.is_terminal());
}

#[rstest]
fn phase_tracks_deadline_and_completion(now: chrono::DateTime<Utc>) {
    let mut event = Event::create(UserId::random(), draft(now), now).expect("valid draft");

    assert_eq!(event.phase(now), EventPhase::Open);
    assert_eq!(event.phase(event.registration_deadline), EventPhase::Open);
    assert_eq!(
        event.phase(event.registration_deadline + Duration::seconds(1)),
        EventPhase::RegistrationClosed
    );

    event.status = EventStatus::Completed;
    assert_eq!(event.phase(now), EventPhase::Completed);
}

#[rstest]
fn reminder_window_absent_without_lead(now: chrono::DateTime<Utc>) {
    let event = Event::create(UserId::random(), draft(now), now).expect("valid draft");
    assert_eq!(event.reminder_window(), None);
    assert!(!event.reminder_due(now));
}

#[rstest]
#[case(-5, true)]
#[case(5, true)]
#[case(-10, true)]
#[case(10, true)]
#[case(-20, false)]
#[case(20, false)]
fn reminder_due_within_tolerance_of_lead(
    now: chrono::DateTime<Utc>,
    #[case] offset_minutes: i64,
    #[case] due: bool,
) {
    let mut d = draft(now);
    d.reminder_lead_hours = Some(2);
    let event = Event::create(UserId::random(), d, now).expect("valid draft");

    let ideal = event.event_date - Duration::hours(2);
    assert_eq!(
        event.reminder_due(ideal + Duration::minutes(offset_minutes)),
        due
    );
}

#[rstest]
fn apply_updates_fields_and_timestamp(now: chrono::DateTime<Utc>) {
    let mut event = Event::create(UserId::random(), draft(now), now).expect("valid draft");
    let later = now + Duration::hours(1);

    let mut d = draft(now);
    d.title = "Renamed".to_owned();
    d.max_participants = 4;
    event.apply(d, later).expect("valid update");

    assert_eq!(event.title, "Renamed");
    assert_eq!(event.max_participants, 4);
    assert_eq!(event.updated_at, later);
    assert_eq!(event.created_at, now);
}

#[rstest]
fn apply_rejects_invalid_draft_without_mutating(now: chrono::DateTime<Utc>) {
    let mut event = Event::create(UserId::random(), draft(now), now).expect("valid draft");
    let original = event.clone();

    let mut d = draft(now);
    d.max_participants = 0;
    assert!(event.apply(d, now + Duration::hours(1)).is_err());
    assert_eq!(event, original);
}
