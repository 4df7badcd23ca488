use sqlx::PgPool;
use uuid::Uuid;

use crate::models::category::{Category, CategoryRequest};

pub struct CategoryService;

impl CategoryService {
    pub async fn list(pool: &PgPool) -> anyhow::Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(categories)
    }

    pub async fn get(pool: &PgPool, id: i32) -> anyhow::Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(category)
    }

    pub async fn create(
        pool: &PgPool,
        author_id: Uuid,
        req: &CategoryRequest,
    ) -> anyhow::Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, author_id)
             VALUES ($1, $2)
             RETURNING *",
        )
        .bind(&req.name)
        .bind(author_id)
        .fetch_one(pool)
        .await?;
        tracing::debug!(category_id = category.id, %author_id, "category created");
        Ok(category)
    }

    /// `None` when the row is gone.
    pub async fn update(
        pool: &PgPool,
        id: i32,
        req: &CategoryRequest,
    ) -> anyhow::Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $1 WHERE id = $2 RETURNING *",
        )
        .bind(&req.name)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(category)
    }

    /// Posts in the category go with it (ON DELETE CASCADE).
    pub async fn delete(pool: &PgPool, id: i32) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
