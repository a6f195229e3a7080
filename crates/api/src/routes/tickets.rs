//! Ticket routes: filing, listing, conversation and lifecycle actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use domain::models::reply::{CreateReplyRequest, ReplyResponse};
use domain::models::ticket::{
    CreateTicketRequest, ListTicketsQuery, ListTicketsResponse, TicketDetailResponse,
    TicketResponse,
};
use domain::services::engagement;
use persistence::entities::{TicketEntity, UserEntity};
use persistence::repositories::{
    CategoryRepository, ReplyRepository, TicketRepository, UserRepository,
};
use shared::pagination::{decode_cursor, encode_cursor};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::{Notifier, TicketLifecycleService};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

async fn load_actor(state: &AppState, user_id: uuid::Uuid) -> Result<UserEntity, ApiError> {
    UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))
}

async fn load_ticket(state: &AppState, ticket_id: i64) -> Result<TicketEntity, ApiError> {
    TicketRepository::new(state.pool.clone())
        .find_by_id(ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))
}

fn authorize_view(ticket: &TicketEntity, actor: &UserEntity) -> Result<(), ApiError> {
    if ticket.user_id != actor.id && !actor.is_admin {
        // Present foreign tickets as missing rather than forbidden.
        return Err(ApiError::NotFound("Ticket not found".to_string()));
    }
    Ok(())
}

fn lifecycle(state: &AppState) -> TicketLifecycleService {
    TicketLifecycleService::new(
        state.pool.clone(),
        Notifier::new(state.pool.clone()),
        state.config.support.notify_owner_on_self_close,
    )
}

/// File a new ticket.
///
/// POST /api/v1/tickets
pub async fn create_ticket(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    request.validate()?;

    let actor = load_actor(&state, user_auth.user_id).await?;

    if let Some(category_id) = request.category_id {
        CategoryRepository::new(state.pool.clone())
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
    }

    let ticket_repo = TicketRepository::new(state.pool.clone());
    let ticket = ticket_repo
        .create(
            actor.id,
            request.subject.trim(),
            request.description.trim(),
            request.priority.unwrap_or_default().into(),
            request.category_id,
        )
        .await?;

    info!(ticket_id = ticket.id, user_id = %actor.id, "Ticket created");

    Notifier::new(state.pool.clone())
        .ticket_created(&ticket, &actor.name)
        .await;

    // A fresh ticket has no replies, so the support team owes the response.
    let needs_response = engagement::classify(&[]).needs_admin_response();

    Ok((
        StatusCode::CREATED,
        Json(TicketResponse::from_ticket(ticket.into(), needs_response)),
    ))
}

/// List the caller's tickets, newest first.
///
/// GET /api/v1/tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let cursor = match &query.cursor {
        Some(raw) => Some(
            decode_cursor(raw).map_err(|_| ApiError::Validation("Invalid cursor".to_string()))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let ticket_repo = TicketRepository::new(state.pool.clone());
    // Fetch one extra row to learn whether another page exists.
    let mut rows = ticket_repo
        .list_for_user(user_auth.user_id, cursor, limit + 1)
        .await?;

    let has_more = rows.len() > limit as usize;
    rows.truncate(limit as usize);

    let next_cursor = if has_more {
        rows.last().map(|row| encode_cursor(row.created_at, row.id))
    } else {
        None
    };

    let data = rows
        .into_iter()
        .map(|row| {
            let (ticket, latest) = row.into_parts();
            let needs_response =
                engagement::classify_latest(latest.as_ref()).needs_admin_response();
            TicketResponse::from_ticket(ticket, needs_response)
        })
        .collect();

    Ok(Json(ListTicketsResponse { data, next_cursor }))
}

/// Fetch a ticket with its full conversation.
///
/// GET /api/v1/tickets/:id
pub async fn get_ticket(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(ticket_id): Path<i64>,
) -> Result<Json<TicketDetailResponse>, ApiError> {
    let actor = load_actor(&state, user_auth.user_id).await?;
    let ticket = load_ticket(&state, ticket_id).await?;
    authorize_view(&ticket, &actor)?;

    let replies = ReplyRepository::new(state.pool.clone())
        .list_for_ticket(ticket.id)
        .await?;

    let summaries: Vec<_> = replies.iter().map(|r| r.summary()).collect();
    let needs_response = engagement::classify(&summaries).needs_admin_response();

    Ok(Json(TicketDetailResponse {
        ticket: TicketResponse::from_ticket(ticket.into(), needs_response),
        replies: replies
            .into_iter()
            .map(|r| ReplyResponse::from(domain::models::Reply::from(r)))
            .collect(),
    }))
}

/// Append a reply to a ticket's conversation.
///
/// POST /api/v1/tickets/:id/replies
///
/// Rejected with 409 when the ticket is closed; the guarded INSERT holds
/// the invariant even against a concurrent close.
pub async fn create_reply(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(ticket_id): Path<i64>,
    Json(request): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<ReplyResponse>), ApiError> {
    request.validate()?;

    let actor = load_actor(&state, user_auth.user_id).await?;
    let ticket = load_ticket(&state, ticket_id).await?;
    authorize_view(&ticket, &actor)?;

    let reply = ReplyRepository::new(state.pool.clone())
        .append_if_open(ticket.id, Some(actor.id), request.body.trim(), actor.is_admin)
        .await?
        .ok_or_else(|| ApiError::Conflict("Cannot reply to a closed ticket".to_string()))?;

    info!(
        ticket_id = ticket.id,
        reply_id = reply.id,
        is_from_admin = reply.is_from_admin,
        "Reply added"
    );

    Notifier::new(state.pool.clone())
        .reply_added(&ticket, reply.is_from_admin, &actor.name)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ReplyResponse::from(domain::models::Reply::from(reply))),
    ))
}

/// Close a ticket.
///
/// POST /api/v1/tickets/:id/close
pub async fn close_ticket(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(ticket_id): Path<i64>,
) -> Result<Json<TicketResponse>, ApiError> {
    let actor = load_actor(&state, user_auth.user_id).await?;
    let ticket = load_ticket(&state, ticket_id).await?;
    authorize_view(&ticket, &actor)?;

    lifecycle(&state).close(&ticket, &actor).await?;

    let closed = load_ticket(&state, ticket_id).await?;
    let latest = ReplyRepository::new(state.pool.clone())
        .latest_for_ticket(ticket_id)
        .await?;
    let needs_response =
        engagement::classify_latest(latest.map(|r| r.summary()).as_ref()).needs_admin_response();

    Ok(Json(TicketResponse::from_ticket(closed.into(), needs_response)))
}

/// Reopen a closed ticket. Administrators only.
///
/// POST /api/v1/tickets/:id/reopen
pub async fn reopen_ticket(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(ticket_id): Path<i64>,
) -> Result<Json<TicketResponse>, ApiError> {
    let actor = load_actor(&state, user_auth.user_id).await?;
    let ticket = load_ticket(&state, ticket_id).await?;

    lifecycle(&state).reopen(&ticket, &actor).await?;

    let reopened = load_ticket(&state, ticket_id).await?;
    let latest = ReplyRepository::new(state.pool.clone())
        .latest_for_ticket(ticket_id)
        .await?;
    let needs_response =
        engagement::classify_latest(latest.map(|r| r.summary()).as_ref()).needs_admin_response();

    Ok(Json(TicketResponse::from_ticket(
        reopened.into(),
        needs_response,
    )))
}
