//! Repository for reply database operations.
//!
//! The replies table is an append-only ledger: this repository exposes no
//! UPDATE or DELETE. Appends are guarded INSERTs conditional on the parent
//! ticket still being open, so the "no replies on closed tickets" invariant
//! holds even when a close lands between the handler's read and the insert.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ReplyEntity;
use crate::metrics::QueryTimer;

const REPLY_COLUMNS: &str = "id, ticket_id, user_id, body, is_from_admin, created_at";

/// Repository for reply operations.
#[derive(Clone)]
pub struct ReplyRepository {
    pool: PgPool,
}

impl ReplyRepository {
    /// Creates a new reply repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a reply iff the parent ticket is still open.
    ///
    /// Returns `None` when the ticket is closed or missing; the caller maps
    /// that to a precondition error without a separate existence check.
    pub async fn append_if_open(
        &self,
        ticket_id: i64,
        user_id: Option<Uuid>,
        body: &str,
        is_from_admin: bool,
    ) -> Result<Option<ReplyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("append_reply_if_open");
        let result = sqlx::query_as::<_, ReplyEntity>(&format!(
            r#"
            INSERT INTO replies (ticket_id, user_id, body, is_from_admin)
            SELECT $1, $2, $3, $4
            WHERE EXISTS (SELECT 1 FROM tickets WHERE id = $1 AND status = 'open')
            RETURNING {REPLY_COLUMNS}
            "#,
        ))
        .bind(ticket_id)
        .bind(user_id)
        .bind(body)
        .bind(is_from_admin)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists a ticket's conversation oldest-first.
    pub async fn list_for_ticket(&self, ticket_id: i64) -> Result<Vec<ReplyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_replies_for_ticket");
        let result = sqlx::query_as::<_, ReplyEntity>(&format!(
            r#"
            SELECT {REPLY_COLUMNS}
            FROM replies
            WHERE ticket_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        ))
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The newest reply on a ticket, ordered by `(created_at, id)`.
    pub async fn latest_for_ticket(
        &self,
        ticket_id: i64,
    ) -> Result<Option<ReplyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_reply_for_ticket");
        let result = sqlx::query_as::<_, ReplyEntity>(&format!(
            r#"
            SELECT {REPLY_COLUMNS}
            FROM replies
            WHERE ticket_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        ))
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
