//! Authentication routes: login and invitation acceptance.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use tracing::info;
use validator::Validate;

use domain::models::user::{AcceptInvitationRequest, LoginRequest, LoginResponse, UserSummary};
use domain::services::invitation::InvitationStatus;
use persistence::repositories::UserRepository;
use shared::crypto::sha256_hex;
use shared::password::{hash_password, verify_password};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// Authenticate with email and password.
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let user_repo = UserRepository::new(state.pool.clone());
    let user = user_repo
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let Some(password_hash) = user.password_hash.as_deref() else {
        // Invited but never accepted; no credential to check.
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    let verified = verify_password(&request.password, password_hash)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))?;

    if !verified {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let jwt_config =
        UserAuth::create_jwt_config(&state.config.jwt).map_err(ApiError::Internal)?;
    let (access_token, _jti) = jwt_config
        .generate_access_token(user.id)
        .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in_secs: state.config.jwt.access_token_expiry_secs,
        user: UserSummary::from(domain::models::User::from(user)),
    }))
}

/// Accept an invitation and set the initial password.
///
/// POST /api/v1/auth/invitation/accept
///
/// Public endpoint. Failures come back as 422 with a message specific
/// enough for the UI to distinguish invalid, expired and already-used
/// tokens.
pub async fn accept_invitation(
    State(state): State<AppState>,
    Json(request): Json<AcceptInvitationRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    request.validate()?;

    let expiry_days = state.config.support.invite_expiry_days;
    let user_repo = UserRepository::new(state.pool.clone());

    let user = user_repo
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::Validation("Invalid invitation token".to_string()))?;

    let user_model = domain::models::User::from(user.clone());
    if !user_model.invitation_token_valid(&request.token, expiry_days) {
        let message = match user_model.invitation_status(expiry_days) {
            InvitationStatus::Expired => "Invitation has expired",
            InvitationStatus::Accepted => "Invitation has already been used",
            InvitationStatus::Pending | InvitationStatus::NotInvited => {
                "Invalid invitation token"
            }
        };
        return Err(ApiError::Validation(message.to_string()));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    // The UPDATE re-checks the whole validity predicate, so a concurrent
    // accept or re-invite loses cleanly here.
    let accepted = user_repo
        .accept_invitation(
            user.id,
            &sha256_hex(&request.token),
            &password_hash,
            expiry_days,
        )
        .await?;

    if !accepted {
        return Err(ApiError::Validation("Invalid invitation token".to_string()));
    }

    info!(user_id = %user.id, "Invitation accepted");

    Ok((
        StatusCode::OK,
        Json(json!({
            "accepted": true,
        })),
    ))
}
