use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::models::GeoPoint;
use crate::services::{FeedRequest, HomeFeedService};

use super::viewer_from_headers;

/// Query parameters for the home feed.
///
/// Everything parses leniently: a value that does not parse falls back to
/// its default instead of failing the request. Clients with a broken
/// location picker still get a feed, just not the nearby category.
#[derive(Debug, Default, Deserialize)]
pub struct HomeFeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl HomeFeedQuery {
    fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(1)
            .max(1)
    }

    fn limit(&self, default_size: i64, max_size: i64) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(default_size)
            .clamp(1, max_size)
    }

    /// Both coordinates present, numeric, and in range; anything else means
    /// no location.
    fn location(&self) -> Option<GeoPoint> {
        let latitude: f64 = self.latitude.as_deref()?.trim().parse().ok()?;
        let longitude: f64 = self.longitude.as_deref()?.trim().parse().ok()?;
        GeoPoint::new(latitude, longitude).ok()
    }
}

/// GET /api/v1/feed/home
pub async fn get_home_feed(
    query: web::Query<HomeFeedQuery>,
    http_req: HttpRequest,
    service: web::Data<HomeFeedService>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let viewer_id = viewer_from_headers(&http_req);
    let page = query.page();
    let limit = query.limit(config.feed.default_page_size, config.feed.max_page_size);
    let location = query.location();

    debug!(
        "Home feed request: viewer={:?} page={} limit={} located={}",
        viewer_id,
        page,
        limit,
        location.is_some()
    );

    let response = service
        .home_feed(FeedRequest {
            viewer_id,
            page,
            limit,
            location,
        })
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/feed/invalidate/{user_id}
///
/// Internal hook for follow/block events. Callers fire it for both sides of
/// the changed edge.
pub async fn invalidate_feed(
    path: web::Path<Uuid>,
    service: web::Data<HomeFeedService>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    service.invalidate_for_user(user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> HomeFeedQuery {
        HomeFeedQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_page_defaults_and_floors() {
        assert_eq!(query(None, None).page(), 1);
        assert_eq!(query(Some("3"), None).page(), 3);
        assert_eq!(query(Some("0"), None).page(), 1);
        assert_eq!(query(Some("-2"), None).page(), 1);
        assert_eq!(query(Some("garbage"), None).page(), 1);
    }

    #[test]
    fn test_limit_clamps_to_bounds() {
        assert_eq!(query(None, None).limit(20, 100), 20);
        assert_eq!(query(None, Some("50")).limit(20, 100), 50);
        assert_eq!(query(None, Some("500")).limit(20, 100), 100);
        assert_eq!(query(None, Some("0")).limit(20, 100), 1);
        assert_eq!(query(None, Some("nope")).limit(20, 100), 20);
    }

    #[test]
    fn test_location_requires_valid_pair() {
        let mut q = HomeFeedQuery::default();
        assert!(q.location().is_none());

        q.latitude = Some("52.52".to_string());
        assert!(q.location().is_none());

        q.longitude = Some("13.405".to_string());
        let point = q.location().unwrap();
        assert!((point.latitude - 52.52).abs() < 1e-9);
        assert!((point.longitude - 13.405).abs() < 1e-9);
    }

    #[test]
    fn test_location_rejects_out_of_range() {
        let q = HomeFeedQuery {
            latitude: Some("91.0".to_string()),
            longitude: Some("13.4".to_string()),
            ..Default::default()
        };
        assert!(q.location().is_none());

        let q = HomeFeedQuery {
            latitude: Some("52.5".to_string()),
            longitude: Some("-181.0".to_string()),
            ..Default::default()
        };
        assert!(q.location().is_none());
    }

    #[test]
    fn test_location_tolerates_garbage() {
        let q = HomeFeedQuery {
            latitude: Some("fifty-two".to_string()),
            longitude: Some("13.4".to_string()),
            ..Default::default()
        };
        assert!(q.location().is_none());
    }
}
