//! Relationship cache: memoized follow graph + viewable set per viewer
//!
//! Three keys per viewer (following list, follower list, viewable set) with
//! independent TTLs. A snapshot read is all-or-nothing: if any key is missing
//! the whole snapshot recomputes, so the three never drift apart by more than
//! one recompute. Follow/unfollow/approval events call `invalidate` for both
//! sides through the service-level hook; otherwise staleness is bounded by
//! the TTLs.
use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{keys, CacheStore};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::services::visibility;
use crate::stores::UserStore;

/// Per-viewer relationship state consumed by candidate retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipSnapshot {
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub viewable_ids: Vec<Uuid>,
}

pub struct RelationshipCache {
    users: Arc<dyn UserStore>,
    cache: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl RelationshipCache {
    pub fn new(users: Arc<dyn UserStore>, cache: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self {
            users,
            cache,
            config,
        }
    }

    /// Cached snapshot for the viewer, recomputing on any missing key.
    /// Cache failures count as misses; the request proceeds on fresh data.
    pub async fn get_or_compute(&self, viewer_id: Uuid) -> Result<RelationshipSnapshot> {
        if let Some(snapshot) = self.read_cached(viewer_id).await {
            debug!("Relationship cache hit for {}", viewer_id);
            return Ok(snapshot);
        }

        debug!("Relationship cache miss for {}", viewer_id);
        let snapshot = self.compute(viewer_id).await?;
        self.write_cached(viewer_id, &snapshot).await;
        Ok(snapshot)
    }

    /// Drop all three keys for a user. Called for both sides of a follow
    /// graph change.
    pub async fn invalidate(&self, user_id: Uuid) -> Result<()> {
        self.cache.delete(&keys::following(user_id)).await?;
        self.cache.delete(&keys::followers(user_id)).await?;
        self.cache.delete(&keys::viewable_set(user_id)).await?;
        debug!("Invalidated relationship cache for {}", user_id);
        Ok(())
    }

    async fn read_cached(&self, viewer_id: Uuid) -> Option<RelationshipSnapshot> {
        let following_key = keys::following(viewer_id);
        let followers_key = keys::followers(viewer_id);
        let viewable_key = keys::viewable_set(viewer_id);
        let (following, followers, viewable) = tokio::join!(
            self.cache.get(&following_key),
            self.cache.get(&followers_key),
            self.cache.get(&viewable_key),
        );

        let following: Vec<Uuid> = serde_json::from_str(&following.ok().flatten()?).ok()?;
        let followers: Vec<Uuid> = serde_json::from_str(&followers.ok().flatten()?).ok()?;
        let viewable_ids: Vec<Uuid> = serde_json::from_str(&viewable.ok().flatten()?).ok()?;

        Some(RelationshipSnapshot {
            following,
            followers,
            viewable_ids,
        })
    }

    async fn compute(&self, viewer_id: Uuid) -> Result<RelationshipSnapshot> {
        let (following, followers, public, blocked) = tokio::join!(
            self.users.following_ids(viewer_id),
            self.users.follower_ids(viewer_id),
            self.users.public_author_ids(),
            self.users.blocked_user_ids(viewer_id),
        );
        let following = following?;
        let followers = followers?;
        let public = public?;
        let blocked: HashSet<Uuid> = blocked?.into_iter().collect();

        let viewable_ids = visibility::compose_viewable(viewer_id, &following, &public, &blocked);

        Ok(RelationshipSnapshot {
            following,
            followers,
            viewable_ids,
        })
    }

    async fn write_cached(&self, viewer_id: Uuid, snapshot: &RelationshipSnapshot) {
        let entries = [
            (
                keys::following(viewer_id),
                serde_json::to_string(&snapshot.following),
                self.config.relationship_ttl_secs,
            ),
            (
                keys::followers(viewer_id),
                serde_json::to_string(&snapshot.followers),
                self.config.relationship_ttl_secs,
            ),
            (
                keys::viewable_set(viewer_id),
                serde_json::to_string(&snapshot.viewable_ids),
                self.config.viewable_ttl_secs,
            ),
        ];

        for (key, json, ttl) in entries {
            match json {
                Ok(json) => {
                    if let Err(e) = self.cache.set_with_ttl(&key, &json, ttl).await {
                        warn!("Failed to write relationship cache {}: {}", key, e);
                    }
                }
                Err(e) => warn!("Failed to serialize relationship cache {}: {}", key, e),
            }
        }
    }
}
