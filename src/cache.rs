//! Caching layer for feed responses and relationship snapshots
//!
//! All cached values are JSON strings under namespaced keys:
//! - feed:home:v1:{viewer|anon}:{page}:{limit}:{geo} → serialized FeedResponse
//! - feed:home:total:{viewer|anon}                   → ranked-list total estimate
//! - rel:viewable:v1:{viewer}                        → viewable author id set
//! - rel:following:v1:{user}                         → following id list
//! - rel:followers:v1:{user}                         → follower id list
//!
//! The Redis backend is the production path; `MemoryCache` implements the
//! same contract for tests and cacheless local runs. The cache is always
//! best-effort: callers treat errors as misses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// String-keyed JSON cache port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a raw JSON payload. `Ok(None)` on miss.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a raw JSON payload with a TTL in seconds.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every key starting with `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;

    /// Connection health check for the readiness probe.
    async fn ping(&self) -> Result<()>;
}

/// Redis-backed cache using a shared `ConnectionManager`.
#[derive(Clone)]
pub struct RedisCache {
    client: Arc<ConnectionManager>,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Config(format!("Failed to create Redis client: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Config(format!("Failed to create Redis connection: {}", e)))?;

        Ok(Self {
            client: Arc::new(manager),
        })
    }

    fn conn(&self) -> ConnectionManager {
        self.client.as_ref().clone()
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| {
                warn!("Redis GET failed for {}: {}", key, e);
                e
            })?;

        if value.is_some() {
            debug!("Cache hit for {}", key);
        } else {
            debug!("Cache miss for {}", key);
        }
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<_, ()>(&mut self.conn())
            .await
            .map_err(|e| {
                warn!("Redis SETEX failed for {}: {}", key, e);
                e
            })?;

        debug!("Cached {} with TTL={}s", key, ttl_seconds);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut self.conn())
            .await
            .map_err(|e| {
                warn!("Redis DEL failed for {}: {}", key, e);
                e
            })?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        // SCAN is non-blocking unlike KEYS
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut total_deleted = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut self.conn())
                .await
                .map_err(|e| {
                    warn!("Redis SCAN failed for {}: {}", pattern, e);
                    e
                })?;

            if !keys.is_empty() {
                redis::cmd("DEL")
                    .arg(&keys)
                    .query_async::<_, ()>(&mut self.conn())
                    .await
                    .map_err(|e| {
                        warn!("Redis DEL failed: {}", e);
                        e
                    })?;
                total_deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        if total_deleted > 0 {
            debug!("Invalidated {} keys under {}", total_deleted, prefix);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        redis::cmd("PING")
            .query_async::<_, String>(&mut self.conn())
            .await
            .map_err(|e| {
                warn!("Redis PING failed: {}", e);
                e
            })?;
        Ok(())
    }
}

/// In-process cache with the same contract as `RedisCache`.
///
/// Expiry is checked on read, so tests can use a zero TTL to exercise
/// eviction without sleeping.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, (String, Option<Instant>)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Option<Instant>)>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Internal("Memory cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some((_, Some(expires_at))) if Instant::now() >= *expires_at => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
        self.lock()?
            .insert(key.to_string(), (value.to_string(), Some(expires_at)));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        self.lock()?.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Cache key builders. Kept in one place so the invalidation prefixes and the
/// write paths can never drift apart.
pub mod keys {
    use uuid::Uuid;

    use crate::models::GeoPoint;

    /// Viewer segment: the user id, or `anon` for anonymous requests.
    fn viewer_segment(viewer: Option<Uuid>) -> String {
        match viewer {
            Some(id) => id.to_string(),
            None => "anon".to_string(),
        }
    }

    /// Coordinates are bucketed to 3 decimal places (~110 m) so nearby
    /// requests from the same spot share a cache entry.
    fn geo_segment(location: Option<GeoPoint>) -> String {
        match location {
            Some(point) => format!(
                "{}:{}",
                (point.latitude * 1000.0).round() as i64,
                (point.longitude * 1000.0).round() as i64
            ),
            None => "_:_".to_string(),
        }
    }

    pub fn home_page(
        viewer: Option<Uuid>,
        page: i64,
        limit: i64,
        location: Option<GeoPoint>,
    ) -> String {
        format!(
            "feed:home:v1:{}:{}:{}:{}",
            viewer_segment(viewer),
            page,
            limit,
            geo_segment(location)
        )
    }

    /// Prefix covering every cached page for one viewer.
    pub fn home_prefix(viewer: Option<Uuid>) -> String {
        format!("feed:home:v1:{}:", viewer_segment(viewer))
    }

    pub fn home_total(viewer: Option<Uuid>) -> String {
        format!("feed:home:total:{}", viewer_segment(viewer))
    }

    pub fn viewable_set(viewer: Uuid) -> String {
        format!("rel:viewable:v1:{}", viewer)
    }

    pub fn following(user_id: Uuid) -> String {
        format!("rel:following:v1:{}", user_id)
    }

    pub fn followers(user_id: Uuid) -> String {
        format!("rel:followers:v1:{}", user_id)
    }
}
