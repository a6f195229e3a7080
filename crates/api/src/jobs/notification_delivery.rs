//! Notification queue delivery job.
//!
//! Drains undelivered rows from the durable queue and pushes each one
//! through the configured delivery channel. Failures are recorded on the
//! row and retried on later passes up to the attempt cap; nothing here ever
//! reaches back into the transition that enqueued the row.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use domain::services::notification::{DeliveryResult, NotificationChannel, NotificationKind};
use persistence::entities::QueuedNotificationEntity;
use persistence::repositories::{NotificationRepository, UserRepository};

use crate::middleware::metrics::record_notifications_delivered;

use super::scheduler::{Job, JobFrequency};

/// Background job that delivers queued notifications.
pub struct NotificationDeliveryJob {
    pool: PgPool,
    channel: Arc<dyn NotificationChannel>,
    batch_size: i64,
}

impl NotificationDeliveryJob {
    /// Create a new delivery job.
    pub fn new(pool: PgPool, channel: Arc<dyn NotificationChannel>, batch_size: i64) -> Self {
        Self {
            pool,
            channel,
            batch_size,
        }
    }

    /// Attempt delivery of one queued row.
    ///
    /// Returns true when the row was settled (delivered or permanently
    /// skipped), false when it stays queued for a later pass.
    async fn deliver_one(
        &self,
        notifications: &NotificationRepository,
        users: &UserRepository,
        row: &QueuedNotificationEntity,
    ) -> Result<bool, sqlx::Error> {
        let Some(kind) = NotificationKind::parse(&row.kind) else {
            warn!(id = row.id, kind = %row.kind, "Unknown notification kind, dropping");
            notifications.mark_delivered(row.id).await?;
            return Ok(true);
        };

        let payload = match serde_json::from_value(row.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(id = row.id, error = %e, "Malformed notification payload, dropping");
                notifications.mark_delivered(row.id).await?;
                return Ok(true);
            }
        };

        let recipient = match users.find_by_id(row.recipient_id).await? {
            Some(user) => user,
            None => {
                warn!(
                    id = row.id,
                    recipient = %row.recipient_id,
                    "Notification recipient no longer exists, dropping"
                );
                notifications.mark_delivered(row.id).await?;
                return Ok(true);
            }
        };

        match self
            .channel
            .deliver(&recipient.email, &recipient.name, kind, &payload)
            .await
        {
            DeliveryResult::Sent => {
                notifications.mark_delivered(row.id).await?;
                Ok(true)
            }
            DeliveryResult::NoChannel => {
                warn!(
                    id = row.id,
                    recipient = %row.recipient_id,
                    "No deliverable address for recipient, dropping"
                );
                notifications.mark_delivered(row.id).await?;
                Ok(true)
            }
            DeliveryResult::Failed(e) => {
                warn!(id = row.id, error = %e, "Notification delivery failed");
                notifications.record_failure(row.id, &e).await?;
                Ok(false)
            }
        }
    }
}

#[async_trait::async_trait]
impl Job for NotificationDeliveryJob {
    fn name(&self) -> &'static str {
        "notification_delivery"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let notifications = NotificationRepository::new(self.pool.clone());
        let users = UserRepository::new(self.pool.clone());

        let batch = notifications
            .fetch_undelivered(self.batch_size)
            .await
            .map_err(|e| format!("Failed to fetch undelivered notifications: {}", e))?;

        if batch.is_empty() {
            return Ok(());
        }

        let mut delivered: usize = 0;

        for row in &batch {
            match self.deliver_one(&notifications, &users, row).await {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(id = row.id, error = %e, "Failed to settle notification row");
                }
            }
        }

        if delivered > 0 {
            record_notifications_delivered(delivered);
            info!(
                delivered = delivered,
                batch = batch.len(),
                "Delivered queued notifications"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_job_frequency_is_one_minute() {
        let freq = JobFrequency::Minutes(1);
        assert_eq!(freq.duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_kind_parse_round_trip() {
        assert_eq!(
            NotificationKind::parse("ticket_auto_closed"),
            Some(NotificationKind::TicketAutoClosed)
        );
        assert_eq!(NotificationKind::parse("carrier_pigeon"), None);
    }
}
