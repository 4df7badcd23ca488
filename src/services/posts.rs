use sqlx::PgPool;
use uuid::Uuid;

use crate::models::post::{CreatePostRequest, Post, PostFilter, UpdatePostRequest};

pub struct PostService;

impl PostService {
    pub async fn list(pool: &PgPool, filter: &PostFilter) -> anyhow::Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts
             WHERE ($1::INT IS NULL OR category_id = $1)
               AND ($2::UUID IS NULL OR author_id = $2)
             ORDER BY created_at DESC",
        )
        .bind(filter.category_id)
        .bind(filter.author_id)
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    pub async fn get(pool: &PgPool, id: i32) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(post)
    }

    pub async fn create(
        pool: &PgPool,
        author_id: Uuid,
        req: &CreatePostRequest,
    ) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            "INSERT INTO posts (title, content, author_id, category_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&req.title)
        .bind(&req.content)
        .bind(author_id)
        .bind(req.category_id)
        .fetch_one(pool)
        .await?;
        tracing::debug!(post_id = post.id, %author_id, "post created");
        Ok(post)
    }

    /// `None` when the row is gone.
    pub async fn update(
        pool: &PgPool,
        id: i32,
        req: &UpdatePostRequest,
    ) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "UPDATE posts
             SET title = COALESCE($1, title),
                 content = COALESCE($2, content),
                 category_id = COALESCE($3, category_id),
                 updated_at = NOW()
             WHERE id = $4
             RETURNING *",
        )
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.category_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(post)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
