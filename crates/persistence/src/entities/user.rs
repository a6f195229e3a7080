//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::user::User;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub invite_token_hash: Option<String>,
    pub invite_created_at: Option<DateTime<Utc>>,
    pub invite_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            password_hash: entity.password_hash,
            is_admin: entity.is_admin,
            invite_token_hash: entity.invite_token_hash,
            invite_created_at: entity.invite_created_at,
            invite_accepted_at: entity.invite_accepted_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
