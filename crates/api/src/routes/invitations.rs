//! Invitation routes: admin-driven user provisioning and the public
//! invitation-status lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use domain::models::user::{InvitationStatusResponse, InviteUserRequest, InviteUserResponse};
use domain::services::invitation;
use persistence::repositories::UserRepository;
use shared::crypto::{generate_invite_token, sha256_hex};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::EmailService;

/// Invite a new user, or re-invite an existing one who has not yet
/// accepted. A fresh token always supersedes the outstanding one.
///
/// POST /api/v1/admin/users/invite
///
/// The plaintext token appears in the response exactly once; only its
/// digest is stored.
pub async fn invite_user(
    State(state): State<AppState>,
    Json(request): Json<InviteUserRequest>,
) -> Result<(StatusCode, Json<InviteUserResponse>), ApiError> {
    request.validate()?;

    let expiry_days = state.config.support.invite_expiry_days;
    let user_repo = UserRepository::new(state.pool.clone());

    let user = match user_repo.find_by_email(&request.email).await? {
        Some(existing) => {
            if existing.password_hash.is_some() || existing.invite_accepted_at.is_some() {
                return Err(ApiError::Conflict(
                    "User already has an active account".to_string(),
                ));
            }
            existing
        }
        None => {
            user_repo
                .create_invited(&request.email, &request.name, request.is_admin)
                .await?
        }
    };

    let token = generate_invite_token();
    user_repo
        .set_invitation(user.id, &sha256_hex(&token))
        .await?;

    let expires_at = invitation::expires_at(Utc::now(), expiry_days);

    info!(user_id = %user.id, email = %user.email, "Invitation issued");

    // Best-effort email; the invitation is valid regardless of delivery.
    let email_service = EmailService::new(state.config.email.clone());
    if let Err(e) = email_service
        .send_invitation_email(&user.email, &user.name, &token, expires_at)
        .await
    {
        warn!(user_id = %user.id, error = %e, "Failed to send invitation email");
    }

    Ok((
        StatusCode::CREATED,
        Json(InviteUserResponse {
            user_id: user.id,
            email: user.email,
            token,
            expires_at,
        }),
    ))
}

/// Look up the state of an invitation token.
///
/// GET /api/v1/invitations/:token
///
/// Public endpoint used by the account-setup page to phrase its messaging;
/// unknown tokens are a 404, known ones report pending/expired/accepted.
pub async fn invitation_status(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InvitationStatusResponse>, ApiError> {
    let user_repo = UserRepository::new(state.pool.clone());

    let user = user_repo
        .find_by_invite_token_hash(&sha256_hex(&token))
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    let status = domain::models::User::from(user)
        .invitation_status(state.config.support.invite_expiry_days);

    Ok(Json(InvitationStatusResponse { status }))
}
