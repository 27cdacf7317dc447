//! Data models for the home feed service
//!
//! Split in two layers:
//! - Row types read from the collaborator stores (`Post`, `Comment`,
//!   `UserSummary`, `PostInteraction`) — this service never writes them.
//! - Wire types returned by the feed endpoint (`FeedItem`, `FeedResponse`),
//!   serialized camelCase for the mobile clients.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Media kind of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum PostType {
    Photo,
    Reel,
    Video,
    Story,
}

/// Commerce classification of a post. Drives the content-type ranking weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum PostContentType {
    Normal,
    Service,
    Product,
    Business,
    /// Raw reel uploads; excluded from home-feed retrieval.
    Reel,
}

impl PostContentType {
    /// Content types eligible for home-feed candidate retrieval.
    pub fn feed_eligible(&self) -> bool {
        matches!(
            self,
            PostContentType::Normal
                | PostContentType::Service
                | PostContentType::Product
                | PostContentType::Business
        )
    }
}

/// Per-post visibility override. Unset means public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum PostVisibility {
    Public,
    Default,
}

/// Account-level privacy setting. Unset is treated as public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum AccountPrivacy {
    Public,
    Private,
}

/// Geographic point (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude (-90 to 90)
    pub latitude: f64,
    /// Longitude (-180 to 180)
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err("Invalid latitude: must be between -90 and 90".to_string());
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err("Invalid longitude: must be between -180 and 180".to_string());
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Distance between two points using the Haversine formula (kilometers).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// Post row as read from the post store. Engagement counters are maintained
/// by the engagement subsystem; this service only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_type: PostType,
    pub content_type: PostContentType,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub view_count: i64,
    pub visibility: Option<PostVisibility>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Post location, when both coordinates are present.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).ok(),
            _ => None,
        }
    }
}

/// Minimal author/commenter profile attached during enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Comment row. Soft-deleted comments carry a timestamp and are excluded
/// from previews.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub soft_delete: Option<DateTime<Utc>>,
}

/// Kind of recorded viewer action on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Like,
    Comment,
    Share,
    Hide,
}

/// Aggregated (viewer, post, kind) interaction row, maintained by the
/// interaction tracker. Read by the scoring engine to demote fatigued posts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostInteraction {
    pub post_id: Uuid,
    pub kind: InteractionKind,
    pub interaction_count: i64,
    pub last_interacted_at: DateTime<Utc>,
    pub is_hidden: bool,
}

/// Business account attributes consumed by the nearby candidate path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessLocation {
    pub owner_id: Uuid,
    pub live_location: bool,
    pub subscription_active: bool,
    pub latitude: f64,
    pub longitude: f64,
}

/// Comment preview on a feed item (at most three per post). Replies are
/// loaded on demand by the comment endpoints and always empty here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentPreview {
    pub id: Uuid,
    pub author: UserSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<CommentPreview>,
}

/// Fully enriched feed entry returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: Uuid,
    pub author: UserSummary,
    pub post_type: PostType,
    pub content_type: PostContentType,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub ranking_score: f64,
    pub is_liked_by: bool,
    pub comments: Vec<CommentPreview>,
}

/// Pagination metadata. `total` is exact on the first page and a cached
/// estimate afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Feed response model returned by the home-feed endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub feed: Vec<FeedItem>,
    pub pagination: PaginationMeta,
}
