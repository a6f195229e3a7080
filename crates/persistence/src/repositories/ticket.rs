//! Repository for ticket database operations.
//!
//! All status mutations are conditional updates: the WHERE clause re-checks
//! the precondition so a racing writer (a user closing while the auto-closer
//! runs, or two admins acting at once) resolves to exactly one winner.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    AutoCloseCandidateEntity, OpenTicketEngagementEntity, TicketEntity, TicketPriorityDb,
    TicketStatusDb, TicketWithLatestReplyEntity,
};
use crate::metrics::QueryTimer;

/// Columns selected for a plain ticket row.
const TICKET_COLUMNS: &str = "id, user_id, subject, description, status, priority, category_id, \
                              closed_at, created_at, updated_at";

/// Repository for ticket operations.
#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    /// Creates a new ticket repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new open ticket.
    pub async fn create(
        &self,
        user_id: Uuid,
        subject: &str,
        description: &str,
        priority: TicketPriorityDb,
        category_id: Option<Uuid>,
    ) -> Result<TicketEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_ticket");
        let result = sqlx::query_as::<_, TicketEntity>(&format!(
            r#"
            INSERT INTO tickets (user_id, subject, description, priority, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TICKET_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(subject)
        .bind(description)
        .bind(priority)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds a ticket by its id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<TicketEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ticket_by_id");
        let result = sqlx::query_as::<_, TicketEntity>(&format!(
            r#"
            SELECT {TICKET_COLUMNS}
            FROM tickets
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists a user's tickets newest-first with their latest reply, using a
    /// keyset cursor on `(created_at, id)`.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        cursor: Option<(DateTime<Utc>, i64)>,
        limit: i64,
    ) -> Result<Vec<TicketWithLatestReplyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tickets_for_user");
        let (cursor_at, cursor_id) = cursor.unwrap_or((DateTime::<Utc>::MAX_UTC, i64::MAX));
        let result = sqlx::query_as::<_, TicketWithLatestReplyEntity>(
            r#"
            SELECT t.id, t.user_id, t.subject, t.description, t.status, t.priority,
                   t.category_id, t.closed_at, t.created_at, t.updated_at,
                   lr.id AS latest_reply_id,
                   lr.is_from_admin AS latest_reply_is_from_admin,
                   lr.created_at AS latest_reply_created_at
            FROM tickets t
            LEFT JOIN LATERAL (
                SELECT r.id, r.is_from_admin, r.created_at
                FROM replies r
                WHERE r.ticket_id = t.id
                ORDER BY r.created_at DESC, r.id DESC
                LIMIT 1
            ) lr ON TRUE
            WHERE t.user_id = $1
              AND (t.created_at, t.id) < ($2, $3)
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists all tickets newest-first with their latest reply, optionally
    /// filtered by status.
    pub async fn list_all(
        &self,
        status: Option<TicketStatusDb>,
        cursor: Option<(DateTime<Utc>, i64)>,
        limit: i64,
    ) -> Result<Vec<TicketWithLatestReplyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_tickets");
        let (cursor_at, cursor_id) = cursor.unwrap_or((DateTime::<Utc>::MAX_UTC, i64::MAX));
        let result = sqlx::query_as::<_, TicketWithLatestReplyEntity>(
            r#"
            SELECT t.id, t.user_id, t.subject, t.description, t.status, t.priority,
                   t.category_id, t.closed_at, t.created_at, t.updated_at,
                   lr.id AS latest_reply_id,
                   lr.is_from_admin AS latest_reply_is_from_admin,
                   lr.created_at AS latest_reply_created_at
            FROM tickets t
            LEFT JOIN LATERAL (
                SELECT r.id, r.is_from_admin, r.created_at
                FROM replies r
                WHERE r.ticket_id = t.id
                ORDER BY r.created_at DESC, r.id DESC
                LIMIT 1
            ) lr ON TRUE
            WHERE ($1::ticket_status IS NULL OR t.status = $1)
              AND (t.created_at, t.id) < ($2, $3)
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $4
            "#,
        )
        .bind(status)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Closes a ticket iff it is still open.
    ///
    /// Returns `true` when this call performed the transition, `false` when
    /// the ticket was already closed (or does not exist) - the caller treats
    /// that as a precondition failure, not an error.
    pub async fn close_if_open(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("close_ticket_if_open");
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET status = 'closed', closed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Reopens a ticket iff it is currently closed.
    pub async fn reopen_if_closed(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("reopen_ticket_if_closed");
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET status = 'open', closed_at = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'closed'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Counts tickets by status.
    pub async fn count_by_status(&self) -> Result<(i64, i64), sqlx::Error> {
        let timer = QueryTimer::new("count_tickets_by_status");
        let result = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'open'),
                   COUNT(*) FILTER (WHERE status = 'closed')
            FROM tickets
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Latest-reply projections for every open ticket.
    ///
    /// The aggregate needing-response count classifies these rows through the
    /// canonical engagement function rather than re-deriving the rule in SQL.
    pub async fn open_ticket_engagements(
        &self,
    ) -> Result<Vec<OpenTicketEngagementEntity>, sqlx::Error> {
        let timer = QueryTimer::new("open_ticket_engagements");
        let result = sqlx::query_as::<_, OpenTicketEngagementEntity>(
            r#"
            SELECT t.id AS ticket_id,
                   lr.id AS latest_reply_id,
                   lr.is_from_admin AS latest_reply_is_from_admin,
                   lr.created_at AS latest_reply_created_at
            FROM tickets t
            LEFT JOIN LATERAL (
                SELECT r.id, r.is_from_admin, r.created_at
                FROM replies r
                WHERE r.ticket_id = t.id
                ORDER BY r.created_at DESC, r.id DESC
                LIMIT 1
            ) lr ON TRUE
            WHERE t.status = 'open'
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// One keyset batch of auto-close candidates.
    ///
    /// A ticket qualifies when it is open and its newest reply is a staff
    /// reply older than the threshold. The predicate itself is the
    /// idempotence guard: tickets closed on a previous pass, or revived by a
    /// fresh customer reply, simply never match again. `after_id` pages
    /// through the backlog in bounded batches.
    pub async fn auto_close_candidates(
        &self,
        threshold_days: i64,
        after_id: i64,
        batch_size: i64,
    ) -> Result<Vec<AutoCloseCandidateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("auto_close_candidates");
        let result = sqlx::query_as::<_, AutoCloseCandidateEntity>(
            r#"
            SELECT t.id, t.user_id, t.subject,
                   lr.id AS latest_reply_id,
                   lr.user_id AS latest_reply_user_id,
                   lr.is_from_admin AS latest_reply_is_from_admin,
                   lr.created_at AS latest_reply_created_at
            FROM tickets t
            JOIN LATERAL (
                SELECT r.id, r.user_id, r.is_from_admin, r.created_at
                FROM replies r
                WHERE r.ticket_id = t.id
                ORDER BY r.created_at DESC, r.id DESC
                LIMIT 1
            ) lr ON TRUE
            WHERE t.status = 'open'
              AND t.id > $1
              AND lr.is_from_admin = TRUE
              AND lr.created_at < NOW() - ($2 || ' days')::INTERVAL
            ORDER BY t.id
            LIMIT $3
            "#,
        )
        .bind(after_id)
        .bind(threshold_days as i32)
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
