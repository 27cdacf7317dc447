//! Configuration management for the home feed service
//!
//! All settings load from environment variables with sensible development
//! defaults. Scoring weights are exposed so operators can tune ranking
//! without a redeploy.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Cache (Redis) configuration
    pub cache: CacheConfig,
    /// Feed pipeline configuration
    pub feed: FeedConfig,
    /// Scoring weights
    pub scoring: ScoringConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; empty disables Redis and falls back to in-process cache
    pub url: String,
    /// TTL for cached feed pages
    pub response_ttl_secs: u64,
    /// Shorter TTL for cached empty pages, so cold users recover quickly
    pub response_empty_ttl_secs: u64,
    /// TTL for the cached viewable-author set
    pub viewable_ttl_secs: u64,
    /// TTL for cached following/follower id lists
    pub relationship_ttl_secs: u64,
    /// TTL for the cached total-count estimate used by later pages
    pub total_count_ttl_secs: u64,
}

/// Feed pipeline configuration (candidate bounds, geo radius, windows)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Per-category candidate cap; clamped to 50..=100
    pub candidate_limit: i64,
    /// Radius for the nearby category, kilometers
    pub nearby_radius_km: f64,
    /// Trending window, hours
    pub trending_window_hours: i64,
    /// How far back viewer interactions count against a post, days
    pub interaction_lookback_days: i64,
    /// Default page size when the client sends none
    pub default_page_size: i64,
    /// Upper bound on page size; larger requests are clamped
    pub max_page_size: i64,
}

/// Scoring weights (defaults match the production ranking formula)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub base_followed: f64,
    pub base_nearby: f64,
    pub base_trending: f64,
    pub base_general: f64,
    /// Multiplier applied to the base score for followed authors
    pub followed_multiplier: f64,
    /// Recency boost at age zero; decays linearly to zero
    pub recency_max_boost: f64,
    /// Boost lost per 24h of post age
    pub recency_decay_per_day: f64,
    pub content_type_product: f64,
    pub content_type_service: f64,
    pub content_type_business: f64,
    pub content_type_normal: f64,
    pub content_type_other: f64,
    pub engagement_like_weight: f64,
    pub engagement_comment_weight: f64,
    pub engagement_share_weight: f64,
    pub engagement_view_weight: f64,
    /// Ceiling on the engagement component
    pub engagement_cap: f64,
    pub penalty_hidden: f64,
    pub penalty_recent_view: f64,
    pub penalty_heavy_interaction: f64,
    pub penalty_light_interaction: f64,
    /// Scores within this distance of each other tie-break randomly
    pub tie_epsilon: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_followed: 100.0,
            base_nearby: 75.0,
            base_trending: 50.0,
            base_general: 25.0,
            followed_multiplier: 2.0,
            recency_max_boost: 20.0,
            recency_decay_per_day: 10.0,
            content_type_product: 15.0,
            content_type_service: 12.0,
            content_type_business: 10.0,
            content_type_normal: 8.0,
            content_type_other: 5.0,
            engagement_like_weight: 1.0,
            engagement_comment_weight: 2.0,
            engagement_share_weight: 3.0,
            engagement_view_weight: 0.1,
            engagement_cap: 30.0,
            penalty_hidden: 90.0,
            penalty_recent_view: 60.0,
            penalty_heavy_interaction: 40.0,
            penalty_light_interaction: 20.0,
            tie_epsilon: 5.0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) if app_env.eq_ignore_ascii_case("production") => {
                return Err("DATABASE_URL must be set in production".to_string())
            }
            Err(_) => "postgresql://localhost/homefeed".to_string(),
        };

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("HOMEFEED_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("HOMEFEED_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8084),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            cache: CacheConfig {
                // Unset or empty means no Redis; main falls back to the
                // in-process cache.
                url: std::env::var("REDIS_URL").unwrap_or_default(),
                response_ttl_secs: std::env::var("FEED_RESPONSE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(120),
                response_empty_ttl_secs: std::env::var("FEED_RESPONSE_EMPTY_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
                viewable_ttl_secs: std::env::var("FEED_VIEWABLE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
                relationship_ttl_secs: std::env::var("FEED_RELATIONSHIP_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(120),
                total_count_ttl_secs: std::env::var("FEED_TOTAL_COUNT_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            },
            feed: FeedConfig {
                // Caps outside 50..=100 starve or flood the ranking stage.
                candidate_limit: std::env::var("FEED_CANDIDATE_LIMIT")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(75)
                    .clamp(50, 100),
                nearby_radius_km: parse_env_or_default("FEED_NEARBY_RADIUS_KM", 20.0)?,
                trending_window_hours: std::env::var("FEED_TRENDING_WINDOW_HOURS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(24),
                interaction_lookback_days: std::env::var("FEED_INTERACTION_LOOKBACK_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
                default_page_size: std::env::var("FEED_DEFAULT_PAGE_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20),
                max_page_size: std::env::var("FEED_MAX_PAGE_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(100),
            },
            scoring: {
                let d = ScoringConfig::default();
                ScoringConfig {
                    base_followed: parse_env_or_default("SCORE_BASE_FOLLOWED", d.base_followed)?,
                    base_nearby: parse_env_or_default("SCORE_BASE_NEARBY", d.base_nearby)?,
                    base_trending: parse_env_or_default("SCORE_BASE_TRENDING", d.base_trending)?,
                    base_general: parse_env_or_default("SCORE_BASE_GENERAL", d.base_general)?,
                    followed_multiplier: parse_env_or_default(
                        "SCORE_FOLLOWED_MULTIPLIER",
                        d.followed_multiplier,
                    )?,
                    recency_max_boost: parse_env_or_default(
                        "SCORE_RECENCY_MAX_BOOST",
                        d.recency_max_boost,
                    )?,
                    recency_decay_per_day: parse_env_or_default(
                        "SCORE_RECENCY_DECAY_PER_DAY",
                        d.recency_decay_per_day,
                    )?,
                    content_type_product: parse_env_or_default(
                        "SCORE_CONTENT_TYPE_PRODUCT",
                        d.content_type_product,
                    )?,
                    content_type_service: parse_env_or_default(
                        "SCORE_CONTENT_TYPE_SERVICE",
                        d.content_type_service,
                    )?,
                    content_type_business: parse_env_or_default(
                        "SCORE_CONTENT_TYPE_BUSINESS",
                        d.content_type_business,
                    )?,
                    content_type_normal: parse_env_or_default(
                        "SCORE_CONTENT_TYPE_NORMAL",
                        d.content_type_normal,
                    )?,
                    content_type_other: parse_env_or_default(
                        "SCORE_CONTENT_TYPE_OTHER",
                        d.content_type_other,
                    )?,
                    engagement_like_weight: parse_env_or_default(
                        "SCORE_ENGAGEMENT_LIKE_WEIGHT",
                        d.engagement_like_weight,
                    )?,
                    engagement_comment_weight: parse_env_or_default(
                        "SCORE_ENGAGEMENT_COMMENT_WEIGHT",
                        d.engagement_comment_weight,
                    )?,
                    engagement_share_weight: parse_env_or_default(
                        "SCORE_ENGAGEMENT_SHARE_WEIGHT",
                        d.engagement_share_weight,
                    )?,
                    engagement_view_weight: parse_env_or_default(
                        "SCORE_ENGAGEMENT_VIEW_WEIGHT",
                        d.engagement_view_weight,
                    )?,
                    engagement_cap: parse_env_or_default("SCORE_ENGAGEMENT_CAP", d.engagement_cap)?,
                    penalty_hidden: parse_env_or_default("SCORE_PENALTY_HIDDEN", d.penalty_hidden)?,
                    penalty_recent_view: parse_env_or_default(
                        "SCORE_PENALTY_RECENT_VIEW",
                        d.penalty_recent_view,
                    )?,
                    penalty_heavy_interaction: parse_env_or_default(
                        "SCORE_PENALTY_HEAVY_INTERACTION",
                        d.penalty_heavy_interaction,
                    )?,
                    penalty_light_interaction: parse_env_or_default(
                        "SCORE_PENALTY_LIGHT_INTERACTION",
                        d.penalty_light_interaction,
                    )?,
                    tie_epsilon: parse_env_or_default("SCORE_TIE_EPSILON", d.tie_epsilon)?,
                }
            },
        })
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 75,
            nearby_radius_km: 20.0,
            trending_window_hours: 24,
            interaction_lookback_days: 30,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            response_ttl_secs: 120,
            response_empty_ttl_secs: 30,
            viewable_ttl_secs: 300,
            relationship_ttl_secs: 120,
            total_count_ttl_secs: 300,
        }
    }
}

fn parse_env_or_default(key: &str, default: f64) -> Result<f64, String> {
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
