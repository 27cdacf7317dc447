//! Read ports onto collaborator data.
//!
//! The feed service never owns users, posts, likes, comments, interactions or
//! business profiles; it only reads them. Each concern gets one `async_trait`
//! port implemented against Postgres in `db/` and faked in-memory by the
//! integration tests.
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AccountPrivacy, Comment, GeoPoint, Post, UserSummary};

/// Follow graph, block list and profile reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Ids the user follows (accepted edges only).
    async fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    /// Ids following the user.
    async fn follower_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    /// Union of both block directions: ids the user blocked and ids that
    /// blocked the user.
    async fn blocked_user_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    /// All non-deleted public account ids.
    async fn public_author_ids(&self) -> Result<Vec<Uuid>>;

    /// Privacy setting for one account; `None` when the account does not
    /// exist or is deleted.
    async fn account_privacy(&self, user_id: Uuid) -> Result<Option<AccountPrivacy>>;

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    /// True when a block exists in either direction between the two users.
    async fn is_blocked_either_way(&self, user_a: Uuid, user_b: Uuid) -> Result<bool>;

    /// Batched profile summaries; missing/deleted ids are simply absent from
    /// the result.
    async fn user_summaries(&self, user_ids: &[Uuid]) -> Result<Vec<UserSummary>>;
}

/// Post reads. All implementations return only feed-eligible content types
/// (normal, service, product, business) from non-deleted authors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Newest posts by the given authors.
    async fn recent_by_authors(&self, author_ids: &[Uuid], limit: i64) -> Result<Vec<Post>>;

    /// Posts by the given authors created at or after `since`, ordered by the
    /// engagement composite (likes + 2*comments + 3*shares + 0.1*views)
    /// descending.
    async fn trending_by_authors(
        &self,
        author_ids: &[Uuid],
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// Geotagged posts by the given authors within `radius_km` of `center`,
    /// newest first.
    async fn located_near(
        &self,
        author_ids: &[Uuid],
        center: GeoPoint,
        radius_km: f64,
        limit: i64,
    ) -> Result<Vec<Post>>;
}

/// Viewer like state and comment previews.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Subset of `post_ids` the viewer has liked.
    async fn liked_post_ids(&self, viewer_id: Uuid, post_ids: &[Uuid]) -> Result<HashSet<Uuid>>;

    /// Up to `per_post` newest non-deleted top-level comments for each post,
    /// flattened into one list.
    async fn top_comments_for_posts(
        &self,
        post_ids: &[Uuid],
        per_post: i64,
    ) -> Result<Vec<Comment>>;
}

/// Aggregated viewer/post interaction history feeding the scoring penalty.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// All (post, kind) aggregates for the viewer touched at or after `since`.
    async fn interactions_for_viewer(
        &self,
        viewer_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<crate::models::PostInteraction>>;
}

/// Business accounts relevant to the nearby candidate category.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BusinessStore: Send + Sync {
    /// Owner ids of businesses with live location sharing and an active
    /// subscription within `radius_km` of `center`.
    async fn live_owner_ids_near(&self, center: GeoPoint, radius_km: f64) -> Result<Vec<Uuid>>;
}
