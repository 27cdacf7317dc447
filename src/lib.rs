pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod openapi;
pub mod services;
pub mod stores;

pub use cache::{CacheStore, MemoryCache, RedisCache};
pub use config::Config;
pub use error::{AppError, Result};

// Re-export the feed pipeline components
pub use services::{
    CandidateRetriever, Enricher, FeedRequest, HomeFeedService, RankedCandidate,
    RelationshipCache, RelationshipSnapshot, ScoringEngine, SourceCategory, ViewerContext,
    VisibilityResolver,
};
