//! Home feed orchestration: response cache, pipeline, invalidation
//!
//! Request flow: response cache read → (relationships ∥ blocked ∥
//! interactions) → candidate fan-out → scoring → dedup/rank → page slice →
//! enrichment → response cache write. Store failures anywhere abort the
//! request; cache failures on either side are logged and the request runs
//! live. The cache is never a hard dependency.
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{keys, CacheStore};
use crate::config::{CacheConfig, Config, FeedConfig};
use crate::error::Result;
use crate::metrics::{
    FEED_CACHE_EVENTS, FEED_CACHE_WRITE_TOTAL, FEED_CANDIDATE_COUNT,
    FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL,
};
use crate::models::{FeedResponse, GeoPoint, PaginationMeta};
use crate::services::candidates::{CandidateRetriever, ViewerContext};
use crate::services::enrichment::Enricher;
use crate::services::ranking;
use crate::services::relationships::RelationshipCache;
use crate::services::scoring::{summarize_interactions, ScoringEngine};
use crate::services::visibility::VisibilityResolver;
use crate::stores::{BusinessStore, EngagementStore, InteractionStore, PostStore, UserStore};

/// Normalized feed request, after query parsing and clamping.
#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub viewer_id: Option<Uuid>,
    pub page: i64,
    pub limit: i64,
    pub location: Option<GeoPoint>,
}

pub struct HomeFeedService {
    users: Arc<dyn UserStore>,
    interactions: Arc<dyn InteractionStore>,
    cache: Arc<dyn CacheStore>,
    relationships: RelationshipCache,
    visibility: VisibilityResolver,
    retriever: CandidateRetriever,
    scoring: ScoringEngine,
    enricher: Enricher,
    feed_config: FeedConfig,
    cache_config: CacheConfig,
    tie_epsilon: f64,
    /// Fixed RNG seed for deterministic ranking in tests; entropy-seeded
    /// when unset.
    rng_seed: Option<u64>,
}

impl HomeFeedService {
    pub fn new(
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        engagement: Arc<dyn EngagementStore>,
        interactions: Arc<dyn InteractionStore>,
        businesses: Arc<dyn BusinessStore>,
        cache: Arc<dyn CacheStore>,
        config: &Config,
    ) -> Self {
        Self {
            relationships: RelationshipCache::new(
                users.clone(),
                cache.clone(),
                config.cache.clone(),
            ),
            visibility: VisibilityResolver::new(users.clone()),
            retriever: CandidateRetriever::new(posts, businesses, config.feed.clone()),
            scoring: ScoringEngine::new(config.scoring.clone()),
            enricher: Enricher::new(users.clone(), engagement),
            users,
            interactions,
            cache,
            feed_config: config.feed.clone(),
            cache_config: config.cache.clone(),
            tie_epsilon: config.scoring.tie_epsilon,
            rng_seed: None,
        }
    }

    /// Pin the ranking RNG seed. Test-only wiring; production seeds from
    /// entropy per request.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Serve one feed page, from cache when possible. Pagination is clamped
    /// here as well as in the HTTP layer, so direct callers cannot drive the
    /// page math with a zero or negative limit.
    pub async fn home_feed(&self, request: FeedRequest) -> Result<FeedResponse> {
        let start = Instant::now();
        let request = FeedRequest {
            page: request.page.max(1),
            limit: request.limit.max(1),
            ..request
        };
        let cache_key = keys::home_page(
            request.viewer_id,
            request.page,
            request.limit,
            request.location,
        );

        match self.cache.get(&cache_key).await {
            Ok(Some(json)) => match serde_json::from_str::<FeedResponse>(&json) {
                Ok(response) => {
                    FEED_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                    FEED_REQUEST_DURATION_SECONDS
                        .with_label_values(&["cache"])
                        .observe(start.elapsed().as_secs_f64());
                    FEED_REQUEST_TOTAL.with_label_values(&["cache"]).inc();
                    return Ok(response);
                }
                Err(e) => {
                    warn!("Discarding undecodable cached page {}: {}", cache_key, e);
                    FEED_CACHE_EVENTS.with_label_values(&["error"]).inc();
                }
            },
            Ok(None) => {
                FEED_CACHE_EVENTS.with_label_values(&["miss"]).inc();
            }
            Err(_) => {
                // Already logged by the cache layer; compute live
                FEED_CACHE_EVENTS.with_label_values(&["error"]).inc();
            }
        }

        let response = self.build_feed(&request).await?;

        let ttl = if response.feed.is_empty() {
            self.cache_config.response_empty_ttl_secs
        } else {
            self.cache_config.response_ttl_secs
        };
        match serde_json::to_string(&response) {
            Ok(json) => {
                if let Err(e) = self.cache.set_with_ttl(&cache_key, &json, ttl).await {
                    warn!("Failed to cache feed page {}: {}", cache_key, e);
                    FEED_CACHE_WRITE_TOTAL.with_label_values(&["error"]).inc();
                } else {
                    FEED_CACHE_WRITE_TOTAL.with_label_values(&["success"]).inc();
                }
            }
            Err(e) => {
                warn!("Failed to serialize feed page for cache: {}", e);
                FEED_CACHE_WRITE_TOTAL.with_label_values(&["error"]).inc();
            }
        }

        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&["computed"])
            .observe(start.elapsed().as_secs_f64());
        FEED_REQUEST_TOTAL.with_label_values(&["computed"]).inc();

        Ok(response)
    }

    /// Full pipeline, no response cache involved.
    async fn build_feed(&self, request: &FeedRequest) -> Result<FeedResponse> {
        let now = Utc::now();

        let (ctx, interaction_rows) = match request.viewer_id {
            Some(viewer) => {
                let since = now - Duration::days(self.feed_config.interaction_lookback_days);
                let (snapshot, blocked, rows) = tokio::join!(
                    self.relationships.get_or_compute(viewer),
                    self.users.blocked_user_ids(viewer),
                    self.interactions.interactions_for_viewer(viewer, since),
                );
                let snapshot = snapshot?;
                let blocked: HashSet<Uuid> = blocked?.into_iter().collect();

                let ctx = ViewerContext {
                    viewer_id: Some(viewer),
                    following: snapshot.following.into_iter().collect(),
                    followers: snapshot.followers.into_iter().collect(),
                    viewable: snapshot.viewable_ids.into_iter().collect(),
                    blocked,
                    location: request.location,
                };
                (ctx, rows?)
            }
            None => {
                let viewable = self.visibility.viewable_author_ids(None).await?;
                (
                    ViewerContext::anonymous(viewable, request.location),
                    Vec::new(),
                )
            }
        };

        let sets = self.retriever.fetch(&ctx).await?;
        FEED_CANDIDATE_COUNT
            .with_label_values(&["followed"])
            .observe(sets.followed.len() as f64);
        FEED_CANDIDATE_COUNT
            .with_label_values(&["nearby"])
            .observe(sets.nearby.len() as f64);
        FEED_CANDIDATE_COUNT
            .with_label_values(&["trending"])
            .observe(sets.trending.len() as f64);
        FEED_CANDIDATE_COUNT
            .with_label_values(&["general"])
            .observe(sets.general.len() as f64);

        let interactions = summarize_interactions(interaction_rows);
        let scored = self.scoring.score_candidates(sets, &interactions, now);

        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let ranked = ranking::dedup_and_rank(scored, self.tie_epsilon, &mut rng);

        let total = self
            .resolve_total(request.viewer_id, request.page, ranked.len() as i64)
            .await;

        let offset = (request.page - 1).saturating_mul(request.limit).max(0) as usize;
        let end = offset.saturating_add(request.limit as usize).min(ranked.len());
        let page_slice = ranked.get(offset..end).unwrap_or(&[]);

        let feed = self.enricher.enrich_page(request.viewer_id, page_slice).await?;

        let total_pages = (total + request.limit - 1) / request.limit;

        debug!(
            "Built home feed: viewer={:?} page={} items={} total={}",
            request.viewer_id,
            request.page,
            feed.len(),
            total
        );

        Ok(FeedResponse {
            feed,
            pagination: PaginationMeta {
                page: request.page,
                limit: request.limit,
                total,
                total_pages,
            },
        })
    }

    /// Ranked-list total: exact on page 1 (and cached), cached figure on
    /// later pages so pagination metadata stays stable while the pool moves.
    async fn resolve_total(&self, viewer_id: Option<Uuid>, page: i64, ranked_total: i64) -> i64 {
        let key = keys::home_total(viewer_id);

        if page > 1 {
            if let Some(cached) = self.cache.get(&key).await.ok().flatten() {
                if let Ok(total) = cached.parse::<i64>() {
                    return total;
                }
            }
        }

        if let Err(e) = self
            .cache
            .set_with_ttl(
                &key,
                &ranked_total.to_string(),
                self.cache_config.total_count_ttl_secs,
            )
            .await
        {
            warn!("Failed to cache feed total for {:?}: {}", viewer_id, e);
        }
        ranked_total
    }

    /// Follow-event hook: drop the user's relationship snapshot and every
    /// cached response page. Callers invoke it for both sides of the edge.
    pub async fn invalidate_for_user(&self, user_id: Uuid) -> Result<()> {
        self.relationships.invalidate(user_id).await?;
        self.cache
            .delete_prefix(&keys::home_prefix(Some(user_id)))
            .await?;
        self.cache.delete(&keys::home_total(Some(user_id))).await?;
        info!("Invalidated cached feed state for {}", user_id);
        Ok(())
    }
}
