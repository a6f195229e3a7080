//! Reply domain model.
//!
//! Replies are the ticket's append-only conversation ledger: once created
//! they are never edited or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::validate_body;

/// A single message on a ticket, attributed to a customer or staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Reply {
    pub id: i64,
    pub ticket_id: i64,
    /// Null for system-attributed rows whose staff author no longer resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub body: String,
    pub is_from_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    /// The projection the engagement classifier operates on.
    pub fn summary(&self) -> ReplySummary {
        ReplySummary {
            id: self.id,
            is_from_admin: self.is_from_admin,
            created_at: self.created_at,
        }
    }
}

/// Minimal reply projection for engagement classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplySummary {
    pub id: i64,
    pub is_from_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to append a reply to a ticket.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateReplyRequest {
    #[validate(custom(function = "validate_body"))]
    pub body: String,
}

/// Reply representation in API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplyResponse {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub body: String,
    pub is_from_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Reply> for ReplyResponse {
    fn from(reply: Reply) -> Self {
        Self {
            id: reply.id,
            user_id: reply.user_id,
            body: reply.body,
            is_from_admin: reply.is_from_admin,
            created_at: reply.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_projection() {
        let reply = Reply {
            id: 9,
            ticket_id: 3,
            user_id: Some(Uuid::new_v4()),
            body: "Have you tried turning it off and on again?".to_string(),
            is_from_admin: true,
            created_at: Utc::now(),
        };

        let summary = reply.summary();
        assert_eq!(summary.id, 9);
        assert!(summary.is_from_admin);
        assert_eq!(summary.created_at, reply.created_at);
    }

    #[test]
    fn test_create_reply_blank_body_rejected() {
        let request = CreateReplyRequest {
            body: " \n".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_reply_response_from_reply() {
        let reply = Reply {
            id: 1,
            ticket_id: 2,
            user_id: None,
            body: "system note".to_string(),
            is_from_admin: true,
            created_at: Utc::now(),
        };
        let response: ReplyResponse = reply.clone().into();
        assert_eq!(response.id, reply.id);
        assert_eq!(response.user_id, None);
        assert!(response.is_from_admin);
    }
}
