//! Notification kinds, payloads and the delivery channel abstraction.
//!
//! State transitions enqueue durable notification rows; a background job
//! drains the queue and pushes each row through a [`NotificationChannel`].
//! Delivery is fire-and-forget: a failed send never propagates back to the
//! transition that caused it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification kind enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewTicket,
    TicketReplied,
    TicketClosed,
    TicketAutoClosed,
}

impl NotificationKind {
    /// Stable string form used for the queue's `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewTicket => "new_ticket",
            NotificationKind::TicketReplied => "ticket_replied",
            NotificationKind::TicketClosed => "ticket_closed",
            NotificationKind::TicketAutoClosed => "ticket_auto_closed",
        }
    }

    /// Parses the queue column back to a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_ticket" => Some(NotificationKind::NewTicket),
            "ticket_replied" => Some(NotificationKind::TicketReplied),
            "ticket_closed" => Some(NotificationKind::TicketClosed),
            "ticket_auto_closed" => Some(NotificationKind::TicketAutoClosed),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by every ticket notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketEventPayload {
    pub ticket_id: i64,
    /// Externally visible reference code (`TX-1138-...`).
    pub reference: String,
    pub subject: String,
    /// Who caused the event; absent for system-initiated transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    /// For replies: whether the recipient is staff (customer wrote) or the
    /// customer (staff wrote).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_admin: Option<bool>,
    pub occurred_at: DateTime<Utc>,
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone)]
pub enum DeliveryResult {
    /// The notification was handed to the underlying channel.
    Sent,
    /// The recipient has no deliverable address.
    NoChannel,
    /// Delivery failed; retried on a later queue pass.
    Failed(String),
}

/// Delivery channel abstraction (email, console, ...).
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver one notification to one recipient address.
    async fn deliver(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        kind: NotificationKind,
        payload: &TicketEventPayload,
    ) -> DeliveryResult;
}

/// Mock channel for development and testing.
///
/// Logs deliveries but doesn't actually send them.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationChannel {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
}

impl MockNotificationChannel {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for MockNotificationChannel {
    async fn deliver(
        &self,
        recipient_email: &str,
        _recipient_name: &str,
        kind: NotificationKind,
        payload: &TicketEventPayload,
    ) -> DeliveryResult {
        if self.simulate_failure {
            tracing::warn!(
                recipient = %recipient_email,
                kind = %kind,
                ticket = %payload.reference,
                "Mock notification channel simulating failure"
            );
            return DeliveryResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            recipient = %recipient_email,
            kind = %kind,
            ticket = %payload.reference,
            "Mock: would deliver notification"
        );

        DeliveryResult::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TicketEventPayload {
        TicketEventPayload {
            ticket_id: 12,
            reference: "TX-1138-000012".to_string(),
            subject: "Cannot log in".to_string(),
            actor_name: Some("Robin".to_string()),
            to_admin: None,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_kind_string_round_trip() {
        for kind in [
            NotificationKind::NewTicket,
            NotificationKind::TicketReplied,
            NotificationKind::TicketClosed,
            NotificationKind::TicketAutoClosed,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("smoke_signal"), None);
    }

    #[test]
    fn test_payload_serialization_skips_empty_fields() {
        let mut p = payload();
        p.actor_name = None;
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("actor_name"));
        assert!(json.contains("TX-1138-000012"));
    }

    #[tokio::test]
    async fn test_mock_channel_sends() {
        let channel = MockNotificationChannel::new();
        let result = channel
            .deliver("robin@example.com", "Robin", NotificationKind::NewTicket, &payload())
            .await;
        assert!(matches!(result, DeliveryResult::Sent));
    }

    #[tokio::test]
    async fn test_mock_channel_failure() {
        let channel = MockNotificationChannel::failing();
        let result = channel
            .deliver(
                "robin@example.com",
                "Robin",
                NotificationKind::TicketAutoClosed,
                &payload(),
            )
            .await;
        assert!(matches!(result, DeliveryResult::Failed(_)));
    }
}
