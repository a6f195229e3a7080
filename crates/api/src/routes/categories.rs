//! Category lookup route.
//!
//! Categories are managed outside this service; the ticket-filing UI only
//! needs to enumerate them.

use axum::{extract::State, Json};

use domain::models::category::CategoryResponse;
use domain::models::Category;
use persistence::repositories::CategoryRepository;

use crate::app::AppState;
use crate::error::ApiError;

/// List all ticket categories.
///
/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = CategoryRepository::new(state.pool.clone()).list().await?;

    Ok(Json(
        categories
            .into_iter()
            .map(|entity| CategoryResponse::from(Category::from(entity)))
            .collect(),
    ))
}
