//! OpenAPI documentation for the home feed service
use utoipa::OpenApi;

use crate::models::{
    CommentPreview, FeedItem, FeedResponse, PaginationMeta, PostContentType, PostType, UserSummary,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Home Feed Service API",
        version = "1.0.0",
        description = "Personalized home feed for the mobile and web clients. Aggregates followed, nearby, trending, and discovery posts, scores and ranks them per viewer, and serves cached pages with author, like, and comment enrichment.",
    ),
    servers(
        (url = "http://localhost:8084", description = "Development server"),
    ),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "feed", description = "Home feed pages and cache invalidation"),
    ),
    components(schemas(
        FeedResponse,
        FeedItem,
        CommentPreview,
        UserSummary,
        PaginationMeta,
        PostType,
        PostContentType,
    ))
)]
pub struct ApiDoc;
