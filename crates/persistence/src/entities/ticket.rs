//! Ticket entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::reply::ReplySummary;
use domain::models::ticket::{Ticket, TicketPriority, TicketStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for ticket_status that maps to the PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "lowercase")]
pub enum TicketStatusDb {
    Open,
    Closed,
}

impl From<TicketStatusDb> for TicketStatus {
    fn from(db: TicketStatusDb) -> Self {
        match db {
            TicketStatusDb::Open => TicketStatus::Open,
            TicketStatusDb::Closed => TicketStatus::Closed,
        }
    }
}

impl From<TicketStatus> for TicketStatusDb {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Open => TicketStatusDb::Open,
            TicketStatus::Closed => TicketStatusDb::Closed,
        }
    }
}

/// Database enum for ticket_priority that maps to the PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "ticket_priority", rename_all = "lowercase")]
pub enum TicketPriorityDb {
    Low,
    Medium,
    High,
}

impl From<TicketPriorityDb> for TicketPriority {
    fn from(db: TicketPriorityDb) -> Self {
        match db {
            TicketPriorityDb::Low => TicketPriority::Low,
            TicketPriorityDb::Medium => TicketPriority::Medium,
            TicketPriorityDb::High => TicketPriority::High,
        }
    }
}

impl From<TicketPriority> for TicketPriorityDb {
    fn from(priority: TicketPriority) -> Self {
        match priority {
            TicketPriority::Low => TicketPriorityDb::Low,
            TicketPriority::Medium => TicketPriorityDb::Medium,
            TicketPriority::High => TicketPriorityDb::High,
        }
    }
}

/// Database row mapping for the tickets table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    pub status: TicketStatusDb,
    pub priority: TicketPriorityDb,
    pub category_id: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TicketEntity> for Ticket {
    fn from(entity: TicketEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            subject: entity.subject,
            description: entity.description,
            status: entity.status.into(),
            priority: entity.priority.into(),
            category_id: entity.category_id,
            closed_at: entity.closed_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Ticket row joined with its newest reply (if any) for listings.
///
/// The latest-reply columns come from a lateral subquery ordered by
/// `(created_at DESC, id DESC)`, matching the classifier's tie-break.
#[derive(Debug, Clone, FromRow)]
pub struct TicketWithLatestReplyEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    pub status: TicketStatusDb,
    pub priority: TicketPriorityDb,
    pub category_id: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub latest_reply_id: Option<i64>,
    pub latest_reply_is_from_admin: Option<bool>,
    pub latest_reply_created_at: Option<DateTime<Utc>>,
}

impl TicketWithLatestReplyEntity {
    /// The classifier input projection for this row.
    pub fn latest_reply_summary(&self) -> Option<ReplySummary> {
        match (
            self.latest_reply_id,
            self.latest_reply_is_from_admin,
            self.latest_reply_created_at,
        ) {
            (Some(id), Some(is_from_admin), Some(created_at)) => Some(ReplySummary {
                id,
                is_from_admin,
                created_at,
            }),
            _ => None,
        }
    }

    /// Splits the row into the plain ticket and the latest-reply projection.
    pub fn into_parts(self) -> (Ticket, Option<ReplySummary>) {
        let summary = self.latest_reply_summary();
        let ticket = Ticket {
            id: self.id,
            user_id: self.user_id,
            subject: self.subject,
            description: self.description,
            status: self.status.into(),
            priority: self.priority.into(),
            category_id: self.category_id,
            closed_at: self.closed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (ticket, summary)
    }
}

/// Candidate row for the inactivity auto-closer.
///
/// Only rows whose newest reply is a stale staff reply match the candidate
/// query; the latest-reply columns are therefore non-nullable here.
#[derive(Debug, Clone, FromRow)]
pub struct AutoCloseCandidateEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub subject: String,
    pub latest_reply_id: i64,
    pub latest_reply_user_id: Option<Uuid>,
    pub latest_reply_is_from_admin: bool,
    pub latest_reply_created_at: DateTime<Utc>,
}

/// Minimal projection of an open ticket's newest reply, for the aggregate
/// needing-response count.
#[derive(Debug, Clone, FromRow)]
pub struct OpenTicketEngagementEntity {
    pub ticket_id: i64,
    pub latest_reply_id: Option<i64>,
    pub latest_reply_is_from_admin: Option<bool>,
    pub latest_reply_created_at: Option<DateTime<Utc>>,
}

impl OpenTicketEngagementEntity {
    pub fn latest_reply_summary(&self) -> Option<ReplySummary> {
        match (
            self.latest_reply_id,
            self.latest_reply_is_from_admin,
            self.latest_reply_created_at,
        ) {
            (Some(id), Some(is_from_admin), Some(created_at)) => Some(ReplySummary {
                id,
                is_from_admin,
                created_at,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_round_trip() {
        for status in [TicketStatus::Open, TicketStatus::Closed] {
            let db: TicketStatusDb = status.into();
            let back: TicketStatus = db.into();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_priority_mapping_round_trip() {
        for priority in [
            TicketPriority::Low,
            TicketPriority::Medium,
            TicketPriority::High,
        ] {
            let db: TicketPriorityDb = priority.into();
            let back: TicketPriority = db.into();
            assert_eq!(back, priority);
        }
    }

    #[test]
    fn test_latest_reply_summary_requires_all_columns() {
        let row = TicketWithLatestReplyEntity {
            id: 1,
            user_id: Uuid::new_v4(),
            subject: "s".into(),
            description: "d".into(),
            status: TicketStatusDb::Open,
            priority: TicketPriorityDb::Medium,
            category_id: None,
            closed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            latest_reply_id: None,
            latest_reply_is_from_admin: None,
            latest_reply_created_at: None,
        };
        assert!(row.latest_reply_summary().is_none());
    }
}
