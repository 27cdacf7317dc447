//! Postgres-backed post reads for candidate retrieval
//!
//! Every query restricts to feed-eligible content types, public/default
//! visibility and non-deleted posts, and inner-joins the author row so posts
//! of deleted accounts never surface.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{GeoPoint, Post};
use crate::stores::PostStore;

// Approximate km per degree of latitude for the bounding-box prefilter.
const KM_PER_DEGREE: f64 = 111.0;

pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn recent_by_authors(&self, author_ids: &[Uuid], limit: i64) -> Result<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, p.post_type, p.content_type, p.caption, p.media_url,
                   p.like_count, p.comment_count, p.share_count, p.view_count,
                   p.visibility, p.latitude, p.longitude, p.created_at
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id AND u.deleted_at IS NULL
            WHERE p.author_id = ANY($1)
              AND p.deleted_at IS NULL
              AND p.content_type IN ('normal', 'service', 'product', 'business')
              AND (p.visibility IS NULL OR p.visibility IN ('public', 'default'))
            ORDER BY p.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(author_ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn trending_by_authors(
        &self,
        author_ids: &[Uuid],
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, p.post_type, p.content_type, p.caption, p.media_url,
                   p.like_count, p.comment_count, p.share_count, p.view_count,
                   p.visibility, p.latitude, p.longitude, p.created_at
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id AND u.deleted_at IS NULL
            WHERE p.author_id = ANY($1)
              AND p.deleted_at IS NULL
              AND p.created_at >= $2
              AND p.content_type IN ('normal', 'service', 'product', 'business')
              AND (p.visibility IS NULL OR p.visibility IN ('public', 'default'))
            ORDER BY (p.like_count + 2 * p.comment_count + 3 * p.share_count
                      + 0.1 * p.view_count) DESC,
                     p.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(author_ids)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn located_near(
        &self,
        author_ids: &[Uuid],
        center: GeoPoint,
        radius_km: f64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Bounding-box prefilter in SQL, exact Haversine refine below.
        let lat_delta = radius_km / KM_PER_DEGREE;
        let lng_delta = radius_km / (KM_PER_DEGREE * center.latitude.to_radians().cos().max(0.01));

        let candidates = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, p.post_type, p.content_type, p.caption, p.media_url,
                   p.like_count, p.comment_count, p.share_count, p.view_count,
                   p.visibility, p.latitude, p.longitude, p.created_at
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id AND u.deleted_at IS NULL
            WHERE p.author_id = ANY($1)
              AND p.deleted_at IS NULL
              AND p.latitude BETWEEN $2 AND $3
              AND p.longitude BETWEEN $4 AND $5
              AND p.content_type IN ('normal', 'service', 'product', 'business')
              AND (p.visibility IS NULL OR p.visibility IN ('public', 'default'))
            ORDER BY p.created_at DESC
            LIMIT $6
            "#,
        )
        .bind(author_ids)
        .bind(center.latitude - lat_delta)
        .bind(center.latitude + lat_delta)
        .bind(center.longitude - lng_delta)
        .bind(center.longitude + lng_delta)
        .bind(limit * 4)
        .fetch_all(&self.pool)
        .await?;

        let posts = candidates
            .into_iter()
            .filter(|post| {
                post.location()
                    .map(|loc| loc.distance_km(&center) <= radius_km)
                    .unwrap_or(false)
            })
            .take(limit as usize)
            .collect();

        Ok(posts)
    }
}
