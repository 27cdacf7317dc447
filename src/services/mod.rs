pub mod candidates;
pub mod enrichment;
pub mod home_feed;
pub mod ranking;
pub mod relationships;
pub mod scoring;
pub mod visibility;

pub use candidates::{CandidateRetriever, CandidateSets, ViewerContext};
pub use enrichment::Enricher;
pub use home_feed::{FeedRequest, HomeFeedService};
pub use ranking::dedup_and_rank;
pub use relationships::{RelationshipCache, RelationshipSnapshot};
pub use scoring::{InteractionSummary, RankedCandidate, ScoringEngine, SourceCategory};
pub use visibility::VisibilityResolver;
