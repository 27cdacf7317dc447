use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use crate::cache::CacheStore;
use crate::error::Result as AppResult;

/// Shared state for health probes.
pub struct HealthState {
    pool: PgPool,
    cache: Arc<dyn CacheStore>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    pub fn new(pool: PgPool, cache: Arc<dyn CacheStore>) -> Self {
        Self { pool, cache }
    }

    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
    }

    async fn check_cache(&self) -> AppResult<()> {
        self.cache.ping().await
    }
}

pub async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "homefeed-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "homefeed-service"
        })),
    }
}

/// Readiness: Postgres is required; the cache only degrades, because feed
/// requests fall back to live computation when it is down.
pub async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();
    let mut ready = true;
    let mut degraded = false;

    let start = Instant::now();
    let pg_result = state.check_postgres().await;
    let pg_latency = Some(start.elapsed().as_millis() as u64);
    let postgres_check = match pg_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "PostgreSQL connection successful".to_string(),
            latency_ms: pg_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("PostgreSQL connection failed: {}", e),
                latency_ms: pg_latency,
            }
        }
    };
    checks.insert("postgresql".to_string(), postgres_check);

    let start = Instant::now();
    let cache_result = state.check_cache().await;
    let cache_latency = Some(start.elapsed().as_millis() as u64);
    let cache_check = match cache_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Cache ping successful".to_string(),
            latency_ms: cache_latency,
        },
        Err(e) => {
            degraded = true;
            ComponentCheck {
                status: ComponentStatus::Degraded,
                message: format!("Cache ping failed: {}", e),
                latency_ms: cache_latency,
            }
        }
    };
    checks.insert("cache".to_string(), cache_check);

    let status = if !ready {
        ComponentStatus::Unhealthy
    } else if degraded {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Healthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
