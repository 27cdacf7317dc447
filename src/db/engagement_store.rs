//! Postgres-backed like state and comment previews
use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Comment;
use crate::stores::EngagementStore;

pub struct PgEngagementStore {
    pool: PgPool,
}

impl PgEngagementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EngagementStore for PgEngagementStore {
    async fn liked_post_ids(&self, viewer_id: Uuid, post_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT post_id FROM likes WHERE user_id = $1 AND post_id = ANY($2)",
        )
        .bind(viewer_id)
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn top_comments_for_posts(
        &self,
        post_ids: &[Uuid],
        per_post: i64,
    ) -> Result<Vec<Comment>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, content, parent_comment_id, created_at, soft_delete
            FROM (
                SELECT c.id, c.post_id, c.author_id, c.content, c.parent_comment_id,
                       c.created_at, c.soft_delete,
                       ROW_NUMBER() OVER (
                           PARTITION BY c.post_id ORDER BY c.created_at DESC
                       ) AS rn
                FROM comments c
                INNER JOIN users u ON u.id = c.author_id AND u.deleted_at IS NULL
                WHERE c.post_id = ANY($1)
                  AND c.parent_comment_id IS NULL
                  AND c.soft_delete IS NULL
            ) ranked
            WHERE rn <= $2
            ORDER BY post_id, created_at DESC
            "#,
        )
        .bind(post_ids)
        .bind(per_post)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
