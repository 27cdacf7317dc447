use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use homefeed_service::cache::{CacheStore, MemoryCache, RedisCache};
use homefeed_service::db::{
    create_pool, run_migrations, PgBusinessStore, PgEngagementStore, PgInteractionStore,
    PgPostStore, PgUserStore,
};
use homefeed_service::handlers::{self, HealthState};
use homefeed_service::openapi::ApiDoc;
use homefeed_service::services::HomeFeedService;
use homefeed_service::{metrics, Config};

async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&*doc).map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

/// Home Feed Service
///
/// Serves the ranked, personalized home feed: candidate retrieval across
/// followed/nearby/trending/discovery pools, per-viewer scoring, paging,
/// enrichment, and Redis-backed response caching.
///
/// # Routes
///
/// - `GET /api/v1/feed/home` - Ranked feed page for the viewer
/// - `POST /api/v1/feed/invalidate/{user_id}` - Drop cached feed state
/// - `/api/v1/health*` - Probes; `/metrics` - Prometheus exposition
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // JSON logs in production, human-readable everywhere else
    let json_logs = std::env::var("APP_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
    );
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting homefeed-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let pool = match create_pool(&config.database.url, config.database.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Connected to database");

    if let Err(e) = run_migrations(&pool).await {
        tracing::error!("Migration run failed: {:#}", e);
        eprintln!("ERROR: Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let cache: Arc<dyn CacheStore> = if config.cache.url.is_empty() {
        tracing::warn!("REDIS_URL not set; using in-process cache (single instance only)");
        Arc::new(MemoryCache::new())
    } else {
        match RedisCache::new(&config.cache.url).await {
            Ok(redis) => {
                tracing::info!("Connected to Redis cache");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::error!("Redis connection failed: {:#}", e);
                eprintln!("ERROR: Failed to connect to Redis: {}", e);
                std::process::exit(1);
            }
        }
    };

    let feed_service = web::Data::new(HomeFeedService::new(
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgPostStore::new(pool.clone())),
        Arc::new(PgEngagementStore::new(pool.clone())),
        Arc::new(PgInteractionStore::new(pool.clone())),
        Arc::new(PgBusinessStore::new(pool.clone())),
        cache.clone(),
        &config,
    ));
    let health_state = web::Data::new(HealthState::new(pool.clone(), cache.clone()));
    let config_data = web::Data::new(config.clone());

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        let openapi_doc = ApiDoc::openapi();

        App::new()
            .app_data(web::Data::new(openapi_doc.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api/v1/openapi.json", openapi_doc.clone()),
            )
            .route("/api/v1/openapi.json", web::get().to(openapi_json))
            .app_data(feed_service.clone())
            .app_data(health_state.clone())
            .app_data(config_data.clone())
            .wrap(Logger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/api/v1/health", web::get().to(handlers::health_summary))
            .route(
                "/api/v1/health/ready",
                web::get().to(handlers::readiness_summary),
            )
            .route(
                "/api/v1/health/live",
                web::get().to(handlers::liveness_check),
            )
            .service(
                web::scope("/api/v1/feed")
                    .route("/home", web::get().to(handlers::get_home_feed))
                    .route(
                        "/invalidate/{user_id}",
                        web::post().to(handlers::invalidate_feed),
                    ),
            )
    })
    .bind(&bind_address)?
    .workers(4)
    .run()
    .await
}
