//! Invitation token lifecycle rules.
//!
//! Tokens are stored as SHA-256 digests on the user row; the plaintext is
//! handed out once at generation time. A fresh generation always supersedes
//! the previous token, accepted invitations are terminal, and expiry is
//! evaluated lazily - an expired row stays unchanged until the next
//! generate or accept attempt.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use shared::crypto::sha256_hex;

/// Default invitation validity window in days.
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Lifecycle state of a user's invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// No invitation has ever been generated.
    NotInvited,
    /// An invitation is outstanding and within its validity window.
    Pending,
    /// An invitation exists but its window has elapsed.
    Expired,
    /// The invitation was consumed; terminal.
    Accepted,
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationStatus::NotInvited => write!(f, "not_invited"),
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Expired => write!(f, "expired"),
            InvitationStatus::Accepted => write!(f, "accepted"),
        }
    }
}

/// Computes the expiry instant for an invitation created at `created_at`.
pub fn expires_at(created_at: DateTime<Utc>, expiry_days: i64) -> DateTime<Utc> {
    created_at + Duration::days(expiry_days)
}

/// Derives the invitation lifecycle state from the stored fields.
pub fn status(
    token_hash: Option<&str>,
    created_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
    expiry_days: i64,
) -> InvitationStatus {
    if accepted_at.is_some() {
        return InvitationStatus::Accepted;
    }

    let (Some(_), Some(created_at)) = (token_hash, created_at) else {
        return InvitationStatus::NotInvited;
    };

    if Utc::now() < expires_at(created_at, expiry_days) {
        InvitationStatus::Pending
    } else {
        InvitationStatus::Expired
    }
}

/// Whether a presented plaintext token is acceptable right now.
///
/// True iff the digest matches, the invitation has not been accepted, a
/// creation time is recorded, and the validity window has not elapsed.
/// Returns a plain boolean - callers render the specific reason through
/// [`status`] instead of catching errors.
pub fn token_valid(
    token_hash: Option<&str>,
    created_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
    presented: &str,
    expiry_days: i64,
) -> bool {
    let Some(stored_hash) = token_hash else {
        return false;
    };

    if sha256_hex(presented) != stored_hash {
        return false;
    }

    status(token_hash, created_at, accepted_at, expiry_days) == InvitationStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(token: &str) -> String {
        sha256_hex(token)
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        Utc::now() - Duration::days(days)
    }

    #[test]
    fn test_status_not_invited() {
        assert_eq!(status(None, None, None, 7), InvitationStatus::NotInvited);
    }

    #[test]
    fn test_status_pending_within_window() {
        let h = hash("tok");
        assert_eq!(
            status(Some(&h), Some(days_ago(1)), None, 7),
            InvitationStatus::Pending
        );
    }

    #[test]
    fn test_status_expired_after_window() {
        let h = hash("tok");
        assert_eq!(
            status(Some(&h), Some(days_ago(8)), None, 7),
            InvitationStatus::Expired
        );
    }

    #[test]
    fn test_status_accepted_is_terminal() {
        let h = hash("tok");
        // Accepted wins even if the window has elapsed.
        assert_eq!(
            status(Some(&h), Some(days_ago(30)), Some(Utc::now()), 7),
            InvitationStatus::Accepted
        );
    }

    #[test]
    fn test_token_valid_matching_fresh_token() {
        let h = hash("tok");
        assert!(token_valid(Some(&h), Some(days_ago(0)), None, "tok", 7));
    }

    #[test]
    fn test_token_valid_rejects_wrong_token() {
        let h = hash("tok");
        assert!(!token_valid(Some(&h), Some(days_ago(0)), None, "other", 7));
    }

    #[test]
    fn test_token_valid_rejects_expired() {
        let h = hash("tok");
        assert!(!token_valid(Some(&h), Some(days_ago(8)), None, "tok", 7));
    }

    #[test]
    fn test_token_valid_rejects_consumed() {
        let h = hash("tok");
        assert!(!token_valid(
            Some(&h),
            Some(days_ago(1)),
            Some(Utc::now()),
            "tok",
            7
        ));
    }

    #[test]
    fn test_token_valid_rejects_missing_created_at() {
        let h = hash("tok");
        assert!(!token_valid(Some(&h), None, None, "tok", 7));
    }

    #[test]
    fn test_supersede_invalidates_previous_token() {
        // A fresh generate overwrites the stored digest; the first token no
        // longer matches even though its window had not elapsed.
        let second = hash("tok-2");
        assert!(!token_valid(Some(&second), Some(days_ago(0)), None, "tok-1", 7));
        assert!(token_valid(Some(&second), Some(days_ago(0)), None, "tok-2", 7));
    }

    #[test]
    fn test_expires_at() {
        let created = days_ago(0);
        assert_eq!(expires_at(created, 7), created + Duration::days(7));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(InvitationStatus::Pending.to_string(), "pending");
        assert_eq!(InvitationStatus::NotInvited.to_string(), "not_invited");
    }
}
