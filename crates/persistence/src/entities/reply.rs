//! Reply entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::reply::{Reply, ReplySummary};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the replies table.
#[derive(Debug, Clone, FromRow)]
pub struct ReplyEntity {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: Option<Uuid>,
    pub body: String,
    pub is_from_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl ReplyEntity {
    pub fn summary(&self) -> ReplySummary {
        ReplySummary {
            id: self.id,
            is_from_admin: self.is_from_admin,
            created_at: self.created_at,
        }
    }
}

impl From<ReplyEntity> for Reply {
    fn from(entity: ReplyEntity) -> Self {
        Self {
            id: entity.id,
            ticket_id: entity.ticket_id,
            user_id: entity.user_id,
            body: entity.body,
            is_from_admin: entity.is_from_admin,
            created_at: entity.created_at,
        }
    }
}
