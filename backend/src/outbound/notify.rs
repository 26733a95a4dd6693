//! Notification and ratings adapters for the default wiring.
//!
//! The real deployment delegates email and in-app notifications to an
//! external delivery collaborator; this adapter records the intent in the
//! structured log so the engine's fire-and-forget contract can be exercised
//! end to end without a mail server.

use async_trait::async_trait;
use tracing::info;

use crate::domain::event::Event;
use crate::domain::ids::{EventId, UserId};
use crate::domain::ports::{
    EmailKind, NotificationError, NotificationSink, RatingSource, RatingSummary, UserProfile,
};

/// Sink that logs every notification instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn create_notification(
        &self,
        user: &UserId,
        title: &str,
        message: &str,
    ) -> Result<(), NotificationError> {
        info!(%user, title, message, "in-app notification");
        Ok(())
    }

    async fn send_event_email(
        &self,
        recipient: &UserProfile,
        kind: EmailKind,
        event: &Event,
    ) -> Result<(), NotificationError> {
        info!(
            recipient = %recipient.email,
            kind = ?kind,
            event = %event.id,
            title = %event.title,
            "event email"
        );
        Ok(())
    }
}

/// Rating source reporting no ratings, for deployments without the feedback
/// collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRatings;

#[async_trait]
impl RatingSource for NoRatings {
    async fn summary(&self, _event: &EventId) -> RatingSummary {
        RatingSummary::default()
    }
}
