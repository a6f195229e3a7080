//! Repository for user database operations, including the embedded
//! invitation token fields.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = "id, email, name, password_hash, is_admin, invite_token_hash, \
                            invite_created_at, invite_accepted_at, created_at, updated_at";

/// Repository for user operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a user by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds a user by email address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1
            "#,
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds a user by the digest of an outstanding invitation token.
    ///
    /// Used by the public invitation-status lookup, where only the token is
    /// known.
    pub async fn find_by_invite_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_invite_token");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE invite_token_hash = $1
            "#,
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists all administrators (the recipient set for staff-facing
    /// notifications).
    pub async fn list_admins(&self) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_admin_users");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE is_admin = TRUE
            ORDER BY created_at
            "#,
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Creates a user row for an invitee, with no password yet.
    pub async fn create_invited(
        &self,
        email: &str,
        name: &str,
        is_admin: bool,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invited_user");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (email, name, is_admin)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(email)
        .bind(name)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Stores a fresh invitation token digest, unconditionally superseding
    /// any outstanding invitation (resend semantics). Clears the acceptance
    /// timestamp so a re-invite of a stale row starts a clean window.
    pub async fn set_invitation(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("set_user_invitation");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET invite_token_hash = $2,
                invite_created_at = NOW(),
                invite_accepted_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Consumes an invitation atomically: sets the password, stamps the
    /// acceptance time and clears the token digest, guarded by the full
    /// validity predicate in SQL.
    ///
    /// Returns `false` when the token does not match, was already consumed,
    /// or its window has elapsed - two racing accept calls resolve to one
    /// winner because the digest is cleared by the first to commit.
    pub async fn accept_invitation(
        &self,
        user_id: Uuid,
        token_hash: &str,
        password_hash: &str,
        expiry_days: i64,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("accept_user_invitation");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $3,
                invite_token_hash = NULL,
                invite_accepted_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
              AND invite_token_hash = $2
              AND invite_accepted_at IS NULL
              AND invite_created_at IS NOT NULL
              AND invite_created_at > NOW() - ($4 || ' days')::INTERVAL
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(password_hash)
        .bind(expiry_days as i32)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
