//! Prometheus metrics for the home feed service.
//!
//! Exposes feed pipeline collectors and an HTTP handler for the `/metrics`
//! endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Duration of home-feed requests by outcome (cache, computed).
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "homefeed_request_duration_seconds",
        "Home feed request duration segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register homefeed_request_duration_seconds");

    /// Total home-feed requests processed by outcome.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "homefeed_request_total",
        "Total home feed requests segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register homefeed_request_total");

    /// Candidates retrieved per source category before ranking.
    pub static ref FEED_CANDIDATE_COUNT: HistogramVec = register_histogram_vec!(
        "homefeed_candidate_count",
        "Number of feed candidates retrieved segmented by source category",
        &["source"]
    )
    .expect("failed to register homefeed_candidate_count");

    /// Response cache events (hit/miss/error).
    pub static ref FEED_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "homefeed_cache_events_total",
        "Response cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register homefeed_cache_events_total");

    /// Response cache write results (success/error).
    pub static ref FEED_CACHE_WRITE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "homefeed_cache_write_total",
        "Response cache write attempts segmented by result",
        &["result"]
    )
    .expect("failed to register homefeed_cache_write_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
