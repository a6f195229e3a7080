//! Ticket domain model and request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_body, validate_subject};

use super::reply::ReplyResponse;

/// Prefix of the externally visible ticket reference code.
pub const REFERENCE_PREFIX: &str = "TX-1138-";

lazy_static::lazy_static! {
    static ref REFERENCE_REGEX: regex::Regex =
        regex::Regex::new(r"^TX-1138-(\d{6,})$").unwrap();
}

/// Ticket lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Closed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketPriority::Low => write!(f, "low"),
            TicketPriority::Medium => write!(f, "medium"),
            TicketPriority::High => write!(f, "high"),
        }
    }
}

/// A customer support ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Ticket {
    pub id: i64,
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Whether the ticket accepts new replies through the normal path.
    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Open
    }

    /// The externally visible reference code, derived from the row id.
    ///
    /// Zero-padded to six digits; wider ids print in full.
    pub fn reference(&self) -> String {
        reference_for_id(self.id)
    }
}

/// Formats the reference code for a ticket id.
pub fn reference_for_id(id: i64) -> String {
    format!("{}{:06}", REFERENCE_PREFIX, id)
}

/// Parses a reference code back to a ticket id.
///
/// Returns `None` for anything that is not a well-formed reference.
pub fn parse_reference(reference: &str) -> Option<i64> {
    REFERENCE_REGEX
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Request to open a new ticket.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateTicketRequest {
    #[validate(custom(function = "validate_subject"))]
    pub subject: String,

    #[validate(custom(function = "validate_body"))]
    pub description: String,

    /// Defaults to medium when omitted.
    pub priority: Option<TicketPriority>,

    pub category_id: Option<Uuid>,
}

/// Query parameters for listing tickets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListTicketsQuery {
    pub status: Option<TicketStatus>,
    /// Only tickets the support team still owes a response on.
    pub needs_response: Option<bool>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// Ticket representation in API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketResponse {
    pub id: i64,
    pub reference: String,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// True when the support team owes the next response.
    pub needs_admin_response: bool,
}

impl TicketResponse {
    /// Builds the response form of a ticket plus its derived engagement.
    pub fn from_ticket(ticket: Ticket, needs_admin_response: bool) -> Self {
        Self {
            reference: ticket.reference(),
            id: ticket.id,
            subject: ticket.subject,
            description: ticket.description,
            status: ticket.status,
            priority: ticket.priority,
            category_id: ticket.category_id,
            closed_at: ticket.closed_at,
            created_at: ticket.created_at,
            needs_admin_response,
        }
    }
}

/// Ticket detail including the full conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketDetailResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub replies: Vec<ReplyResponse>,
}

/// Paginated ticket listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListTicketsResponse {
    pub data: Vec<TicketResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Admin dashboard aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketStatsResponse {
    pub open: i64,
    pub closed: i64,
    /// Open tickets currently classified as needing an admin response.
    pub needs_response: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ticket(id: i64, status: TicketStatus) -> Ticket {
        Ticket {
            id,
            user_id: Uuid::new_v4(),
            subject: "VPN drops every hour".to_string(),
            description: "Since Monday the tunnel renegotiates and drops.".to_string(),
            status,
            priority: TicketPriority::Medium,
            category_id: None,
            closed_at: match status {
                TicketStatus::Open => None,
                TicketStatus::Closed => Some(Utc::now()),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_reference_zero_padded() {
        assert_eq!(sample_ticket(7, TicketStatus::Open).reference(), "TX-1138-000007");
        assert_eq!(
            sample_ticket(123456, TicketStatus::Open).reference(),
            "TX-1138-123456"
        );
    }

    #[test]
    fn test_reference_wide_ids_print_in_full() {
        assert_eq!(
            sample_ticket(12345678, TicketStatus::Open).reference(),
            "TX-1138-12345678"
        );
    }

    #[test]
    fn test_parse_reference_round_trip() {
        for id in [1, 42, 999_999, 10_000_000] {
            assert_eq!(parse_reference(&reference_for_id(id)), Some(id));
        }
    }

    #[test]
    fn test_parse_reference_rejects_malformed() {
        assert_eq!(parse_reference("TX-1138-"), None);
        assert_eq!(parse_reference("TX-1138-12"), None);
        assert_eq!(parse_reference("TX-9999-000001"), None);
        assert_eq!(parse_reference("000001"), None);
    }

    #[test]
    fn test_is_open() {
        assert!(sample_ticket(1, TicketStatus::Open).is_open());
        assert!(!sample_ticket(1, TicketStatus::Closed).is_open());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TicketStatus::Open.to_string(), "open");
        assert_eq!(TicketStatus::Closed.to_string(), "closed");
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateTicketRequest {
            subject: "Laptop will not boot".to_string(),
            description: "Black screen after the logo.".to_string(),
            priority: Some(TicketPriority::High),
            category_id: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_blank_subject_rejected() {
        let request = CreateTicketRequest {
            subject: "   ".to_string(),
            description: "body".to_string(),
            priority: None,
            category_id: None,
        };
        assert!(request.validate().is_err());
    }
}
