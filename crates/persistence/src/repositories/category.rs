//! Repository for category lookups.
//!
//! Categories are managed outside this service; tickets only reference them.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CategoryEntity;
use crate::metrics::QueryTimer;

/// Repository for category operations.
#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    /// Creates a new category repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a category by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_category_by_id");
        let result = sqlx::query_as::<_, CategoryEntity>(
            r#"
            SELECT id, name, created_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists all categories.
    pub async fn list(&self) -> Result<Vec<CategoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_categories");
        let result = sqlx::query_as::<_, CategoryEntity>(
            r#"
            SELECT id, name, created_at
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
