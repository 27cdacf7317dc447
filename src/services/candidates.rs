//! Candidate retrieval: four bounded source categories fetched concurrently
//!
//! Categories and their author pools:
//! - followed: the viewer's network (following ∪ followers) within the
//!   viewable set
//! - nearby: any viewable author with a geotagged post near the viewer,
//!   plus posts of live-location businesses in the radius
//! - trending: any viewable author, last 24 h, ordered by engagement
//! - general: viewable authors outside the viewer's network and self
//!
//! Blocked users are subtracted from every pool even though the viewable set
//! already excludes them; the cached set may lag a fresh block by its TTL.
//! Any store failure fails the whole fetch.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::error::Result;
use crate::models::{GeoPoint, Post};
use crate::stores::{BusinessStore, PostStore};

/// Per-request viewer state assembled by the orchestrator.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub viewer_id: Option<Uuid>,
    pub following: HashSet<Uuid>,
    pub followers: HashSet<Uuid>,
    pub viewable: HashSet<Uuid>,
    pub blocked: HashSet<Uuid>,
    pub location: Option<GeoPoint>,
}

impl ViewerContext {
    /// Context for an anonymous request: public authors only, no network.
    pub fn anonymous(viewable: HashSet<Uuid>, location: Option<GeoPoint>) -> Self {
        Self {
            viewer_id: None,
            following: HashSet::new(),
            followers: HashSet::new(),
            viewable,
            blocked: HashSet::new(),
            location,
        }
    }
}

/// One bounded post list per source category, in merge order.
#[derive(Debug, Default)]
pub struct CandidateSets {
    pub followed: Vec<Post>,
    pub nearby: Vec<Post>,
    pub trending: Vec<Post>,
    pub general: Vec<Post>,
}

impl CandidateSets {
    pub fn total(&self) -> usize {
        self.followed.len() + self.nearby.len() + self.trending.len() + self.general.len()
    }
}

pub struct CandidateRetriever {
    posts: Arc<dyn PostStore>,
    businesses: Arc<dyn BusinessStore>,
    config: FeedConfig,
}

impl CandidateRetriever {
    pub fn new(
        posts: Arc<dyn PostStore>,
        businesses: Arc<dyn BusinessStore>,
        config: FeedConfig,
    ) -> Self {
        Self {
            posts,
            businesses,
            config,
        }
    }

    /// Fetch all four categories concurrently, each capped at the configured
    /// candidate limit.
    pub async fn fetch(&self, ctx: &ViewerContext) -> Result<CandidateSets> {
        let limit = self.config.candidate_limit;

        let network: HashSet<Uuid> = ctx.following.union(&ctx.followers).copied().collect();

        let followed_authors: Vec<Uuid> = network
            .iter()
            .filter(|id| ctx.viewable.contains(id) && !ctx.blocked.contains(id))
            .copied()
            .collect();

        let open_authors: Vec<Uuid> = ctx
            .viewable
            .iter()
            .filter(|id| !ctx.blocked.contains(id))
            .copied()
            .collect();

        let general_authors: Vec<Uuid> = ctx
            .viewable
            .iter()
            .filter(|id| {
                !ctx.blocked.contains(id)
                    && !network.contains(id)
                    && Some(**id) != ctx.viewer_id
            })
            .copied()
            .collect();

        let trending_since = Utc::now() - Duration::hours(self.config.trending_window_hours);

        let (followed, nearby, trending, general) = tokio::join!(
            self.posts.recent_by_authors(&followed_authors, limit),
            self.fetch_nearby(ctx, &open_authors, limit),
            self.posts
                .trending_by_authors(&open_authors, trending_since, limit),
            self.posts.recent_by_authors(&general_authors, limit),
        );

        let sets = CandidateSets {
            followed: followed?,
            nearby: nearby?,
            trending: trending?,
            general: general?,
        };

        debug!(
            "Feed candidates: {} followed, {} nearby, {} trending, {} general",
            sets.followed.len(),
            sets.nearby.len(),
            sets.trending.len(),
            sets.general.len()
        );

        Ok(sets)
    }

    /// Geotagged posts near the viewer, widened with recent posts of
    /// live-location businesses in the radius. Deduplicated within the
    /// category and truncated to the cap.
    async fn fetch_nearby(
        &self,
        ctx: &ViewerContext,
        open_authors: &[Uuid],
        limit: i64,
    ) -> Result<Vec<Post>> {
        let Some(center) = ctx.location else {
            return Ok(Vec::new());
        };
        let radius = self.config.nearby_radius_km;

        let (geo_posts, owners) = tokio::join!(
            self.posts.located_near(open_authors, center, radius, limit),
            self.businesses.live_owner_ids_near(center, radius),
        );
        let geo_posts = geo_posts?;

        let business_authors: Vec<Uuid> = owners?
            .into_iter()
            .filter(|id| ctx.viewable.contains(id) && !ctx.blocked.contains(id))
            .collect();

        let business_posts = if business_authors.is_empty() {
            Vec::new()
        } else {
            self.posts.recent_by_authors(&business_authors, limit).await?
        };

        let mut seen = HashSet::new();
        let nearby: Vec<Post> = geo_posts
            .into_iter()
            .chain(business_posts)
            .filter(|post| seen.insert(post.id))
            .take(limit as usize)
            .collect();

        Ok(nearby)
    }
}
