//! Admin dashboard routes.
//!
//! Wired behind the admin middleware; handlers here can assume the caller
//! is support staff.

use axum::{
    extract::{Query, State},
    Json,
};

use domain::models::ticket::{ListTicketsQuery, ListTicketsResponse, TicketResponse, TicketStatsResponse};
use domain::services::engagement;
use persistence::repositories::TicketRepository;
use shared::pagination::{decode_cursor, encode_cursor};

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// List every ticket, filterable by status and by whether the support team
/// owes the next response.
///
/// GET /api/v1/admin/tickets
pub async fn list_all_tickets(
    State(state): State<AppState>,
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
    let mut rows = ticket_repo
        .list_all(query.status.map(Into::into), cursor, limit + 1)
        .await?;

    let has_more = rows.len() > limit as usize;
    rows.truncate(limit as usize);

    let next_cursor = if has_more {
        rows.last().map(|row| encode_cursor(row.created_at, row.id))
    } else {
        None
    };

    let mut data: Vec<TicketResponse> = rows
        .into_iter()
        .map(|row| {
            let (ticket, latest) = row.into_parts();
            let needs_response =
                engagement::classify_latest(latest.as_ref()).needs_admin_response();
            TicketResponse::from_ticket(ticket, needs_response)
        })
        .collect();

    // The engagement filter is derived state, so it applies after
    // classification; a filtered page may come back shorter than `limit`.
    if let Some(needs_response) = query.needs_response {
        data.retain(|ticket| ticket.needs_admin_response == needs_response);
    }

    Ok(Json(ListTicketsResponse { data, next_cursor }))
}

/// Aggregate ticket counts for the dashboard.
///
/// GET /api/v1/admin/tickets/stats
pub async fn ticket_stats(
    State(state): State<AppState>,
) -> Result<Json<TicketStatsResponse>, ApiError> {
    let ticket_repo = TicketRepository::new(state.pool.clone());

    let (open, closed) = ticket_repo.count_by_status().await?;

    // Same canonical classifier as the per-ticket views: fetch each open
    // ticket's newest-reply projection and count the ones the team owes.
    let needs_response = ticket_repo
        .open_ticket_engagements()
        .await?
        .iter()
        .filter(|row| {
            engagement::classify_latest(row.latest_reply_summary().as_ref())
                .needs_admin_response()
        })
        .count() as i64;

    Ok(Json(TicketStatsResponse {
        open,
        closed,
        needs_response,
    }))
}
