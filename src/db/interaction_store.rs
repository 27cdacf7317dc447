//! Postgres-backed viewer/post interaction aggregates
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::PostInteraction;
use crate::stores::InteractionStore;

pub struct PgInteractionStore {
    pool: PgPool,
}

impl PgInteractionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionStore for PgInteractionStore {
    async fn interactions_for_viewer(
        &self,
        viewer_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<PostInteraction>> {
        let interactions = sqlx::query_as::<_, PostInteraction>(
            r#"
            SELECT post_id, kind, interaction_count, last_interacted_at, is_hidden
            FROM post_interactions
            WHERE user_id = $1 AND last_interacted_at >= $2
            "#,
        )
        .bind(viewer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(interactions)
    }
}
