//! Scoring engine for feed candidates
//!
//! Score = source_base * relationship_weight
//!       + recency_boost
//!       + content_type_weight
//!       + capped_engagement
//!       - interaction_penalty
//! clamped to a minimum of zero.
//!
//! Components:
//! - Source base: followed 100, nearby 75, trending 50, general 25
//! - Relationship weight: 2.0 for followed authors, 1.0 otherwise
//! - Recency: 20 at age zero, minus 10 per 24h of age, floor 0
//! - Content type: product 15, service 12, business 10, normal 8, other 5
//! - Engagement: likes + 2*comments + 3*shares + 0.1*views, capped at 30
//! - Penalty: hidden 90, viewed in last 24h 60, >3 interactions 40,
//!   >1 interaction 20
//!
//! Posts the viewer hid never reach the ranking stage at all; the hidden
//! penalty row documents the ladder and keeps tuning symmetric.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::ScoringConfig;
use crate::models::{InteractionKind, Post, PostContentType, PostInteraction};
use crate::services::candidates::CandidateSets;

/// Which retrieval category produced a candidate. Determines the base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    Followed,
    Nearby,
    Trending,
    General,
}

impl SourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceCategory::Followed => "followed",
            SourceCategory::Nearby => "nearby",
            SourceCategory::Trending => "trending",
            SourceCategory::General => "general",
        }
    }
}

/// A candidate post with its computed ranking score.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub post: Post,
    pub source: SourceCategory,
    pub score: f64,
}

/// Per-post rollup of the viewer's interaction rows.
#[derive(Debug, Clone, Default)]
pub struct InteractionSummary {
    pub hidden: bool,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub total_count: i64,
}

/// Collapse raw (post, kind) rows into one summary per post.
pub fn summarize_interactions(rows: Vec<PostInteraction>) -> HashMap<Uuid, InteractionSummary> {
    let mut summaries: HashMap<Uuid, InteractionSummary> = HashMap::new();

    for row in rows {
        let summary = summaries.entry(row.post_id).or_default();
        summary.total_count += row.interaction_count;
        if row.is_hidden || row.kind == InteractionKind::Hide {
            summary.hidden = true;
        }
        if row.kind == InteractionKind::View {
            summary.last_viewed_at = match summary.last_viewed_at {
                Some(existing) => Some(existing.max(row.last_interacted_at)),
                None => Some(row.last_interacted_at),
            };
        }
    }

    summaries
}

pub struct ScoringEngine {
    weights: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(weights: ScoringConfig) -> Self {
        Self { weights }
    }

    /// Score every candidate, in merge order (followed, nearby, trending,
    /// general). Posts the viewer hid are dropped here so they can never
    /// out-score their penalty.
    pub fn score_candidates(
        &self,
        sets: CandidateSets,
        interactions: &HashMap<Uuid, InteractionSummary>,
        now: DateTime<Utc>,
    ) -> Vec<RankedCandidate> {
        let mut scored = Vec::with_capacity(sets.total());

        let categories = [
            (sets.followed, SourceCategory::Followed),
            (sets.nearby, SourceCategory::Nearby),
            (sets.trending, SourceCategory::Trending),
            (sets.general, SourceCategory::General),
        ];

        for (posts, source) in categories {
            for post in posts {
                let summary = interactions.get(&post.id);
                if summary.is_some_and(|s| s.hidden) {
                    continue;
                }
                let score = self.score_post(&post, source, summary, now);
                scored.push(RankedCandidate {
                    post,
                    source,
                    score,
                });
            }
        }

        scored
    }

    /// Score one post. Pure; `now` is passed in so tests control the clock.
    pub fn score_post(
        &self,
        post: &Post,
        source: SourceCategory,
        interactions: Option<&InteractionSummary>,
        now: DateTime<Utc>,
    ) -> f64 {
        let w = &self.weights;

        let base = match source {
            SourceCategory::Followed => w.base_followed,
            SourceCategory::Nearby => w.base_nearby,
            SourceCategory::Trending => w.base_trending,
            SourceCategory::General => w.base_general,
        };
        let relationship = match source {
            SourceCategory::Followed => w.followed_multiplier,
            _ => 1.0,
        };

        let age_hours = (now - post.created_at).num_seconds().max(0) as f64 / 3600.0;
        let recency = (w.recency_max_boost - (age_hours / 24.0) * w.recency_decay_per_day).max(0.0);

        let content_type = match post.content_type {
            PostContentType::Product => w.content_type_product,
            PostContentType::Service => w.content_type_service,
            PostContentType::Business => w.content_type_business,
            PostContentType::Normal => w.content_type_normal,
            _ => w.content_type_other,
        };

        let engagement = (w.engagement_like_weight * post.like_count as f64
            + w.engagement_comment_weight * post.comment_count as f64
            + w.engagement_share_weight * post.share_count as f64
            + w.engagement_view_weight * post.view_count as f64)
            .min(w.engagement_cap);

        let penalty = self.interaction_penalty(interactions, now);

        (base * relationship + recency + content_type + engagement - penalty).max(0.0)
    }

    /// Fatigue penalty ladder: first matching rung applies.
    pub fn interaction_penalty(
        &self,
        interactions: Option<&InteractionSummary>,
        now: DateTime<Utc>,
    ) -> f64 {
        let Some(summary) = interactions else {
            return 0.0;
        };
        let w = &self.weights;

        if summary.hidden {
            return w.penalty_hidden;
        }
        if let Some(viewed_at) = summary.last_viewed_at {
            if now - viewed_at < Duration::hours(24) {
                return w.penalty_recent_view;
            }
        }
        if summary.total_count > 3 {
            w.penalty_heavy_interaction
        } else if summary.total_count > 1 {
            w.penalty_light_interaction
        } else {
            0.0
        }
    }
}
