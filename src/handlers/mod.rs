//! HTTP handlers for the home feed endpoints
//!
//! - Feed: ranked home feed page, feed cache invalidation
//! - Health: liveness, readiness, and summary probes
//!
//! Authentication happens at the gateway; handlers only read the forwarded
//! viewer identity header.
pub mod feed;
pub mod health;

pub use feed::{get_home_feed, invalidate_feed};
pub use health::{health_summary, liveness_check, readiness_summary, HealthState};

use actix_web::HttpRequest;
use uuid::Uuid;

/// Viewer identity header set by the gateway after token validation.
pub const VIEWER_HEADER: &str = "x-user-id";

/// Absent or malformed header means an anonymous request, never an error.
pub(crate) fn viewer_from_headers(req: &HttpRequest) -> Option<Uuid> {
    req.headers()
        .get(VIEWER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
}
