//! Deduplication and final ordering of scored candidates
//!
//! Candidates arrive concatenated in merge order (followed, nearby, trending,
//! general), so first-seen dedup keeps the highest-priority source for a post
//! that surfaced in several categories. Non-positive scores are dropped.
//!
//! Ordering is score-descending with a randomized tiebreak: every candidate
//! gets one jitter draw of at most half the tie window, so candidates whose
//! scores differ by more than the window can never swap, while near-ties
//! shuffle between requests. Jitter is a precomputed sort key, not a random
//! comparator, which would not be a total order.
use std::collections::HashSet;

use rand::Rng;
use tracing::warn;

use crate::services::scoring::RankedCandidate;

pub fn dedup_and_rank<R: Rng>(
    candidates: Vec<RankedCandidate>,
    tie_epsilon: f64,
    rng: &mut R,
) -> Vec<RankedCandidate> {
    let mut seen = HashSet::new();
    let half_window = (tie_epsilon / 2.0).max(0.0);

    let mut keyed: Vec<(f64, RankedCandidate)> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.post.id))
        .filter(|candidate| candidate.score > 0.0)
        .map(|candidate| {
            let jitter = if half_window > 0.0 {
                rng.gen_range(-half_window..=half_window)
            } else {
                0.0
            };
            (candidate.score + jitter, candidate)
        })
        .collect();

    keyed.sort_by(|a, b| {
        b.0.partial_cmp(&a.0).unwrap_or_else(|| {
            warn!("Non-comparable ranking score encountered during sort");
            std::cmp::Ordering::Equal
        })
    });

    keyed.into_iter().map(|(_, candidate)| candidate).collect()
}
