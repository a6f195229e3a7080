//! User domain model, including the embedded invitation token fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::validate_password;

use crate::services::invitation::{self, InvitationStatus};

/// An account on the helpdesk: a customer or a member of support staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// Null until the user has set a password (directly or via invitation).
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_admin: bool,
    /// SHA-256 digest of the outstanding invitation token, if any.
    #[serde(skip_serializing)]
    pub invite_token_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Current invitation lifecycle state for this user.
    pub fn invitation_status(&self, expiry_days: i64) -> InvitationStatus {
        invitation::status(
            self.invite_token_hash.as_deref(),
            self.invite_created_at,
            self.invite_accepted_at,
            expiry_days,
        )
    }

    /// Whether the presented plaintext token is currently acceptable.
    pub fn invitation_token_valid(&self, token: &str, expiry_days: i64) -> bool {
        invitation::token_valid(
            self.invite_token_hash.as_deref(),
            self.invite_created_at,
            self.invite_accepted_at,
            token,
            expiry_days,
        )
    }
}

/// Login request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

/// Login response carrying the bearer token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in_secs: i64,
    pub user: UserSummary,
}

/// Public projection of a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_admin: user.is_admin,
        }
    }
}

/// Admin request to invite (or re-invite) a user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct InviteUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Grant support-staff rights on acceptance.
    #[serde(default)]
    pub is_admin: bool,
}

/// Response after inviting a user.
///
/// The plaintext token appears here exactly once; only its digest is stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteUserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Public request to accept an invitation and set the initial password.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct AcceptInvitationRequest {
    pub email: String,
    pub token: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Public invitation status lookup, for graceful UI messaging.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationStatusResponse {
    pub status: InvitationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared::crypto::sha256_hex;

    fn user_with_invite(token: &str, created_ago_days: i64, accepted: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "casey@example.com".to_string(),
            name: "Casey".to_string(),
            password_hash: None,
            is_admin: false,
            invite_token_hash: Some(sha256_hex(token)),
            invite_created_at: Some(Utc::now() - Duration::days(created_ago_days)),
            invite_accepted_at: accepted.then(Utc::now),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_invitation_token_valid_fresh() {
        let user = user_with_invite("tok-abc", 0, false);
        assert!(user.invitation_token_valid("tok-abc", 7));
        assert!(!user.invitation_token_valid("tok-xyz", 7));
    }

    #[test]
    fn test_invitation_token_expired() {
        let user = user_with_invite("tok-abc", 8, false);
        assert!(!user.invitation_token_valid("tok-abc", 7));
        assert_eq!(user.invitation_status(7), InvitationStatus::Expired);
    }

    #[test]
    fn test_invitation_already_accepted() {
        let user = user_with_invite("tok-abc", 1, true);
        assert!(!user.invitation_token_valid("tok-abc", 7));
        assert_eq!(user.invitation_status(7), InvitationStatus::Accepted);
    }

    #[test]
    fn test_user_summary_hides_secrets() {
        let user = user_with_invite("tok-abc", 0, false);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("invite_token_hash"));
    }
}
