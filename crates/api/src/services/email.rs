//! Email delivery for invitations and ticket notifications.
//!
//! Providers:
//! - `console`: logs emails instead of sending them (development)
//! - `smtp`: placeholder pending SMTP relay rollout; logs what would be sent

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use chrono::{DateTime, Utc};
use domain::services::notification::{
    DeliveryResult, NotificationChannel, NotificationKind, TicketEventPayload,
};

use crate::config::EmailConfig;

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Recipient name (optional)
    pub to_name: Option<String>,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body_text: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Check if email sending is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "smtp" => self.send_smtp(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Console provider - logs the email instead of sending it.
    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body_text,
            "Console email"
        );
        Ok(())
    }

    /// SMTP provider - placeholder until the relay is provisioned.
    async fn send_smtp(&self, message: EmailMessage) -> Result<(), EmailError> {
        warn!(
            provider = "smtp",
            host = %self.config.smtp_host,
            port = self.config.smtp_port,
            "SMTP provider not yet implemented"
        );

        info!(
            to = %message.to,
            subject = %message.subject,
            "Email would be sent via SMTP (implementation pending)"
        );

        Ok(())
    }

    /// Send the invitation email with the plaintext setup token.
    pub async fn send_invitation_email(
        &self,
        to_email: &str,
        to_name: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), EmailError> {
        let setup_url = format!("{}/account/setup?token={}", self.config.base_url, token);

        let body_text = format!(
            r#"Hi {name},

You have been invited to the support portal. Set your password using the
link below:

{url}

This invitation expires on {expires}.

If you were not expecting this invitation, you can safely ignore this email.

{sender}"#,
            name = to_name,
            url = setup_url,
            expires = expires_at.format("%Y-%m-%d %H:%M UTC"),
            sender = self.config.sender_name,
        );

        self.send(EmailMessage {
            to: to_email.to_string(),
            to_name: Some(to_name.to_string()),
            subject: "You have been invited to the support portal".to_string(),
            body_text,
        })
        .await
    }

    fn render_notification(
        &self,
        to_name: &str,
        kind: NotificationKind,
        payload: &TicketEventPayload,
    ) -> (String, String) {
        let subject = match kind {
            NotificationKind::NewTicket => {
                format!("[{}] New ticket: {}", payload.reference, payload.subject)
            }
            NotificationKind::TicketReplied => {
                format!("[{}] New reply: {}", payload.reference, payload.subject)
            }
            NotificationKind::TicketClosed => {
                format!("[{}] Ticket closed: {}", payload.reference, payload.subject)
            }
            NotificationKind::TicketAutoClosed => format!(
                "[{}] Ticket closed for inactivity: {}",
                payload.reference, payload.subject
            ),
        };

        let lead = match kind {
            NotificationKind::NewTicket => match &payload.actor_name {
                Some(actor) => format!("{} opened a new ticket.", actor),
                None => "A new ticket was opened.".to_string(),
            },
            NotificationKind::TicketReplied => match &payload.actor_name {
                Some(actor) => format!("{} replied to the ticket.", actor),
                None => "There is a new reply on the ticket.".to_string(),
            },
            NotificationKind::TicketClosed => match &payload.actor_name {
                Some(actor) => format!("{} closed the ticket.", actor),
                None => "The ticket was closed.".to_string(),
            },
            NotificationKind::TicketAutoClosed => {
                "The ticket was closed automatically after a period of inactivity.".to_string()
            }
        };

        let ticket_url = format!("{}/tickets/{}", self.config.base_url, payload.ticket_id);

        let body = format!(
            r#"Hi {name},

{lead}

Ticket:  {subject}
Number:  {reference}

{url}

{sender}"#,
            name = to_name,
            lead = lead,
            subject = payload.subject,
            reference = payload.reference,
            url = ticket_url,
            sender = self.config.sender_name,
        );

        (subject, body)
    }
}

#[async_trait::async_trait]
impl NotificationChannel for EmailService {
    async fn deliver(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        kind: NotificationKind,
        payload: &TicketEventPayload,
    ) -> DeliveryResult {
        if recipient_email.is_empty() {
            return DeliveryResult::NoChannel;
        }

        let (subject, body_text) = self.render_notification(recipient_name, kind, payload);

        let message = EmailMessage {
            to: recipient_email.to_string(),
            to_name: Some(recipient_name.to_string()),
            subject,
            body_text,
        };

        match self.send(message).await {
            Ok(()) => DeliveryResult::Sent,
            Err(e) => DeliveryResult::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            smtp_host: String::new(),
            smtp_port: 587,
            sender_email: "support@example.com".to_string(),
            sender_name: "Support".to_string(),
            base_url: "https://support.example.com".to_string(),
        }
    }

    fn payload() -> TicketEventPayload {
        TicketEventPayload {
            ticket_id: 7,
            reference: "TX-1138-000007".to_string(),
            subject: "Printer on fire".to_string(),
            actor_name: Some("Robin".to_string()),
            to_admin: None,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_console_send() {
        let service = EmailService::new(test_config());
        let result = service
            .send(EmailMessage {
                to: "casey@example.com".to_string(),
                to_name: None,
                subject: "hello".to_string(),
                body_text: "world".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_service_skips_send() {
        let mut config = test_config();
        config.enabled = false;
        let service = EmailService::new(config);
        assert!(!service.is_enabled());

        let result = service
            .send(EmailMessage {
                to: "casey@example.com".to_string(),
                to_name: None,
                subject: "hello".to_string(),
                body_text: "world".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_provider_errors() {
        let mut config = test_config();
        config.provider = "pigeon".to_string();
        let service = EmailService::new(config);

        let result = service
            .send(EmailMessage {
                to: "casey@example.com".to_string(),
                to_name: None,
                subject: "hello".to_string(),
                body_text: "world".to_string(),
            })
            .await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }

    #[test]
    fn test_render_notification_subjects() {
        let service = EmailService::new(test_config());

        let (subject, body) =
            service.render_notification("Casey", NotificationKind::NewTicket, &payload());
        assert!(subject.contains("TX-1138-000007"));
        assert!(subject.contains("New ticket"));
        assert!(body.contains("Robin opened a new ticket."));

        let (subject, body) =
            service.render_notification("Casey", NotificationKind::TicketAutoClosed, &payload());
        assert!(subject.contains("inactivity"));
        assert!(body.contains("closed automatically"));
    }

    #[tokio::test]
    async fn test_deliver_without_address_reports_no_channel() {
        let service = EmailService::new(test_config());
        let result = service
            .deliver("", "Casey", NotificationKind::NewTicket, &payload())
            .await;
        assert!(matches!(result, DeliveryResult::NoChannel));
    }

    #[tokio::test]
    async fn test_deliver_console_sends() {
        let service = EmailService::new(test_config());
        let result = service
            .deliver(
                "casey@example.com",
                "Casey",
                NotificationKind::TicketReplied,
                &payload(),
            )
            .await;
        assert!(matches!(result, DeliveryResult::Sent));
    }
}
