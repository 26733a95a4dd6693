//! In-memory driven adapters.
//!
//! These implement the store and directory ports over mutex-guarded maps.
//! They back the default wiring and the behaviour tests; swapping in a
//! relational adapter only requires implementing the same port traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::event::{Event, EventStatus};
use crate::domain::ids::{EventId, RegistrationId, UserId};
use crate::domain::ports::{
    EventRepository, EventStoreError, RegistrationRepository, RegistrationStoreError,
    UserDirectory, UserDirectoryError, UserProfile,
};
use crate::domain::registration::{Registration, RegistrationStatus};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Map-backed event store.
#[derive(Default)]
pub struct InMemoryEventRepository {
    rows: Mutex<HashMap<EventId, Event>>,
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, event: &Event) -> Result<(), EventStoreError> {
        let mut rows = lock(&self.rows);
        if rows.contains_key(&event.id) {
            return Err(EventStoreError::query(format!(
                "duplicate event id {}",
                event.id
            )));
        }
        rows.insert(event.id, event.clone());
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<(), EventStoreError> {
        let mut rows = lock(&self.rows);
        if !rows.contains_key(&event.id) {
            return Err(EventStoreError::query(format!(
                "no event with id {}",
                event.id
            )));
        }
        rows.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, EventStoreError> {
        Ok(lock(&self.rows).get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Event>, EventStoreError> {
        Ok(lock(&self.rows).values().cloned().collect())
    }

    async fn list_by_host_and_status(
        &self,
        host: &UserId,
        status: EventStatus,
    ) -> Result<Vec<Event>, EventStoreError> {
        Ok(lock(&self.rows)
            .values()
            .filter(|event| event.host.as_ref() == Some(host) && event.status == status)
            .cloned()
            .collect())
    }

    async fn list_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Event>, EventStoreError> {
        Ok(lock(&self.rows)
            .values()
            .filter(|event| {
                matches!(event.status, EventStatus::Active | EventStatus::Full)
                    && event.event_end_time < now
            })
            .cloned()
            .collect())
    }

    async fn list_reminder_candidates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, EventStoreError> {
        Ok(lock(&self.rows)
            .values()
            .filter(|event| {
                matches!(event.status, EventStatus::Active | EventStatus::Full)
                    && event.event_date >= start
                    && event.event_date <= end
            })
            .cloned()
            .collect())
    }

    async fn detach_host(&self, host: &UserId) -> Result<usize, EventStoreError> {
        let mut rows = lock(&self.rows);
        let mut detached = 0;
        for event in rows.values_mut() {
            if event.host.as_ref() == Some(host) {
                event.host = None;
                detached += 1;
            }
        }
        Ok(detached)
    }
}

/// Map-backed registration store. Ordering queries sort here so services can
/// rely on the port's documented order.
#[derive(Default)]
pub struct InMemoryRegistrationRepository {
    rows: Mutex<HashMap<RegistrationId, Registration>>,
}

#[async_trait]
impl RegistrationRepository for InMemoryRegistrationRepository {
    async fn insert(&self, registration: &Registration) -> Result<(), RegistrationStoreError> {
        let mut rows = lock(&self.rows);
        if rows.contains_key(&registration.id) {
            return Err(RegistrationStoreError::query(format!(
                "duplicate registration id {}",
                registration.id
            )));
        }
        rows.insert(registration.id, registration.clone());
        Ok(())
    }

    async fn update(&self, registration: &Registration) -> Result<(), RegistrationStoreError> {
        let mut rows = lock(&self.rows);
        if !rows.contains_key(&registration.id) {
            return Err(RegistrationStoreError::query(format!(
                "no registration with id {}",
                registration.id
            )));
        }
        rows.insert(registration.id, registration.clone());
        Ok(())
    }

    async fn delete(&self, id: &RegistrationId) -> Result<(), RegistrationStoreError> {
        lock(&self.rows).remove(id);
        Ok(())
    }

    async fn find_by_user_and_event(
        &self,
        user: &UserId,
        event: &EventId,
    ) -> Result<Option<Registration>, RegistrationStoreError> {
        Ok(lock(&self.rows)
            .values()
            .find(|row| &row.user == user && &row.event == event)
            .cloned())
    }

    async fn count_by_event_and_status(
        &self,
        event: &EventId,
        status: RegistrationStatus,
    ) -> Result<u64, RegistrationStoreError> {
        Ok(lock(&self.rows)
            .values()
            .filter(|row| &row.event == event && row.status == status)
            .count() as u64)
    }

    async fn list_waitlist_fifo(
        &self,
        event: &EventId,
    ) -> Result<Vec<Registration>, RegistrationStoreError> {
        let mut waitlist: Vec<Registration> = lock(&self.rows)
            .values()
            .filter(|row| &row.event == event && row.status == RegistrationStatus::Waitlist)
            .cloned()
            .collect();
        waitlist.sort_by_key(|row| row.registered_at);
        Ok(waitlist)
    }

    async fn list_by_event_and_status(
        &self,
        event: &EventId,
        status: RegistrationStatus,
    ) -> Result<Vec<Registration>, RegistrationStoreError> {
        Ok(lock(&self.rows)
            .values()
            .filter(|row| &row.event == event && row.status == status)
            .cloned()
            .collect())
    }

    async fn list_by_event(
        &self,
        event: &EventId,
    ) -> Result<Vec<Registration>, RegistrationStoreError> {
        let mut rows: Vec<Registration> = lock(&self.rows)
            .values()
            .filter(|row| &row.event == event)
            .cloned()
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.registered_at));
        Ok(rows)
    }

    async fn list_by_user_and_status(
        &self,
        user: &UserId,
        status: RegistrationStatus,
    ) -> Result<Vec<Registration>, RegistrationStoreError> {
        Ok(lock(&self.rows)
            .values()
            .filter(|row| &row.user == user && row.status == status)
            .cloned()
            .collect())
    }

    async fn delete_all_for_user(&self, user: &UserId) -> Result<usize, RegistrationStoreError> {
        let mut rows = lock(&self.rows);
        let before = rows.len();
        rows.retain(|_, row| &row.user != user);
        Ok(before - rows.len())
    }
}

/// Map-backed user directory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    rows: Mutex<HashMap<UserId, UserProfile>>,
}

impl InMemoryUserDirectory {
    /// Register an active profile.
    pub fn add(&self, profile: UserProfile) {
        lock(&self.rows).insert(profile.id, profile);
    }

    /// Remove a profile, making the user invisible through the port.
    pub fn remove(&self, id: &UserId) {
        lock(&self.rows).remove(id);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_active(
        &self,
        id: &UserId,
    ) -> Result<Option<UserProfile>, UserDirectoryError> {
        Ok(lock(&self.rows).get(id).cloned())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
