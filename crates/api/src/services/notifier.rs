//! Notification dispatcher.
//!
//! Translates each ticket state transition into exactly one queued
//! notification per recipient. Enqueueing is fire-and-forget: the state
//! transition has already committed when the dispatcher runs, so queue
//! failures are logged and swallowed rather than propagated. Recipients are
//! resolved through the injected repositories, never through ambient
//! lookups.

use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use domain::models::ticket::reference_for_id;
use domain::services::notification::{NotificationKind, TicketEventPayload};
use persistence::entities::TicketEntity;
use persistence::repositories::{NotificationRepository, UserRepository};

/// Queue-backed notification dispatcher.
#[derive(Clone)]
pub struct Notifier {
    notifications: NotificationRepository,
    users: UserRepository,
}

impl Notifier {
    /// Creates a new dispatcher over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            notifications: NotificationRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }

    fn payload(
        ticket_id: i64,
        subject: &str,
        actor_name: Option<&str>,
        to_admin: Option<bool>,
    ) -> TicketEventPayload {
        TicketEventPayload {
            ticket_id,
            reference: reference_for_id(ticket_id),
            subject: subject.to_string(),
            actor_name: actor_name.map(|s| s.to_string()),
            to_admin,
            occurred_at: Utc::now(),
        }
    }

    async fn enqueue(&self, recipient_id: Uuid, kind: NotificationKind, payload: &TicketEventPayload) {
        let json = match serde_json::to_value(payload) {
            Ok(json) => json,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to serialize notification payload");
                return;
            }
        };

        if let Err(e) = self
            .notifications
            .enqueue(recipient_id, kind.as_str(), &json)
            .await
        {
            warn!(
                recipient = %recipient_id,
                kind = %kind,
                ticket = %payload.reference,
                error = %e,
                "Failed to enqueue notification"
            );
        }
    }

    async fn enqueue_for_admins(&self, kind: NotificationKind, payload: &TicketEventPayload) {
        let admins = match self.users.list_admins().await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to resolve admin recipients");
                return;
            }
        };

        for admin in admins {
            self.enqueue(admin.id, kind, payload).await;
        }
    }

    /// A new ticket was filed: notify all administrators.
    pub async fn ticket_created(&self, ticket: &TicketEntity, actor_name: &str) {
        let payload = Self::payload(ticket.id, &ticket.subject, Some(actor_name), None);
        self.enqueue_for_admins(NotificationKind::NewTicket, &payload)
            .await;
    }

    /// A reply was appended: staff replies go to the ticket owner, customer
    /// replies go to all administrators.
    pub async fn reply_added(&self, ticket: &TicketEntity, is_from_admin: bool, actor_name: &str) {
        if is_from_admin {
            let payload =
                Self::payload(ticket.id, &ticket.subject, Some(actor_name), Some(false));
            self.enqueue(ticket.user_id, NotificationKind::TicketReplied, &payload)
                .await;
        } else {
            let payload = Self::payload(ticket.id, &ticket.subject, Some(actor_name), Some(true));
            self.enqueue_for_admins(NotificationKind::TicketReplied, &payload)
                .await;
        }
    }

    /// A ticket was closed by a user or admin.
    ///
    /// The owner is notified when someone else closed the ticket; closing
    /// your own ticket notifies only when `notify_owner_on_self_close` is
    /// set.
    pub async fn ticket_closed(
        &self,
        ticket: &TicketEntity,
        actor_id: Uuid,
        actor_name: &str,
        notify_owner_on_self_close: bool,
    ) {
        if actor_id == ticket.user_id && !notify_owner_on_self_close {
            return;
        }

        let payload = Self::payload(ticket.id, &ticket.subject, Some(actor_name), None);
        self.enqueue(ticket.user_id, NotificationKind::TicketClosed, &payload)
            .await;
    }

    /// A ticket was closed by the inactivity auto-closer.
    ///
    /// Only dispatched when the owner still resolves to a live user row.
    pub async fn ticket_auto_closed(&self, ticket_id: i64, owner_id: Uuid, subject: &str) {
        match self.users.find_by_id(owner_id).await {
            Ok(Some(_)) => {
                let payload = Self::payload(ticket_id, subject, None, None);
                self.enqueue(owner_id, NotificationKind::TicketAutoClosed, &payload)
                    .await;
            }
            Ok(None) => {
                warn!(
                    ticket_id = ticket_id,
                    owner = %owner_id,
                    "Skipping auto-close notification: owner no longer exists"
                );
            }
            Err(e) => {
                warn!(
                    ticket_id = ticket_id,
                    owner = %owner_id,
                    error = %e,
                    "Failed to resolve ticket owner for auto-close notification"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_carries_reference() {
        let payload = Notifier::payload(42, "Printer on fire", Some("Robin"), None);
        assert_eq!(payload.reference, "TX-1138-000042");
        assert_eq!(payload.actor_name.as_deref(), Some("Robin"));
        assert_eq!(payload.to_admin, None);
    }

    #[test]
    fn test_reply_payload_direction() {
        let to_customer = Notifier::payload(1, "s", Some("Agent"), Some(false));
        assert_eq!(to_customer.to_admin, Some(false));

        let to_admin = Notifier::payload(1, "s", Some("Customer"), Some(true));
        assert_eq!(to_admin.to_admin, Some(true));
    }
}
