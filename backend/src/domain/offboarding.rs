//! Account offboarding cascade.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::Error;
use super::catalog::EventCatalogService;
use super::enrollment::EnrollmentService;
use super::ids::UserId;
use super::ports::{RegistrationRepository, RegistrationStoreError};

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

/// Summary of the side effects of retiring one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementReport {
    /// Confirmed registrations cancelled (each triggering a promotion pass).
    pub registrations_cancelled: usize,
    /// Hosted events moved to `Suspended`.
    pub events_suspended: usize,
    /// Hosted events whose host reference was nullified.
    pub events_detached: usize,
    /// Registration rows purged outright.
    pub rows_purged: usize,
}

/// Orchestrates the departure of a user account.
///
/// The cascade runs in a fixed order so waitlist promotions happen while the
/// departing user's rows still exist: cancel confirmed seats (promoting from
/// each affected waitlist), suspend hosted events, detach the host reference,
/// then purge the user's remaining rows.
pub struct OffboardingService {
    enrollment: Arc<EnrollmentService>,
    catalog: Arc<EventCatalogService>,
    registrations: Arc<dyn RegistrationRepository>,
}

impl OffboardingService {
    /// Build the cascade over the shared services.
    pub fn new(
        enrollment: Arc<EnrollmentService>,
        catalog: Arc<EventCatalogService>,
        registrations: Arc<dyn RegistrationRepository>,
    ) -> Self {
        Self {
            enrollment,
            catalog,
            registrations,
        }
    }

    /// Retire `user`: free their seats, suspend and detach their events,
    /// purge their rows.
    pub async fn retire_user(&self, user: UserId) -> Result<RetirementReport, Error> {
        let registrations_cancelled = self.enrollment.cancel_active_registrations(user).await?;
        let events_suspended = self.catalog.suspend_host_events(user).await?;
        let events_detached = self.catalog.detach_host(user).await?;
        let rows_purged = self
            .registrations
            .delete_all_for_user(&user)
            .await
            .map_err(map_registration_store_error)?;

        info!(
            %user,
            registrations_cancelled,
            events_suspended,
            events_detached,
            rows_purged,
            "user retired"
        );
        Ok(RetirementReport {
            registrations_cancelled,
            events_suspended,
            events_detached,
            rows_purged,
        })
    }
}

#[cfg(test)]
#[path = "offboarding_tests.rs"]
mod tests;
