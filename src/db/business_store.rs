//! Postgres-backed business location reads for the nearby candidate path
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{BusinessLocation, GeoPoint};
use crate::stores::BusinessStore;

const KM_PER_DEGREE: f64 = 111.0;

pub struct PgBusinessStore {
    pool: PgPool,
}

impl PgBusinessStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BusinessStore for PgBusinessStore {
    async fn live_owner_ids_near(&self, center: GeoPoint, radius_km: f64) -> Result<Vec<Uuid>> {
        // Bounding-box prefilter in SQL, exact Haversine refine below.
        let lat_delta = radius_km / KM_PER_DEGREE;
        let lng_delta = radius_km / (KM_PER_DEGREE * center.latitude.to_radians().cos().max(0.01));

        let businesses = sqlx::query_as::<_, BusinessLocation>(
            r#"
            SELECT b.owner_id, b.live_location, b.subscription_active, b.latitude, b.longitude
            FROM businesses b
            INNER JOIN users u ON u.id = b.owner_id AND u.deleted_at IS NULL
            WHERE b.live_location = TRUE
              AND b.subscription_active = TRUE
              AND b.latitude BETWEEN $1 AND $2
              AND b.longitude BETWEEN $3 AND $4
            "#,
        )
        .bind(center.latitude - lat_delta)
        .bind(center.latitude + lat_delta)
        .bind(center.longitude - lng_delta)
        .bind(center.longitude + lng_delta)
        .fetch_all(&self.pool)
        .await?;

        let owner_ids = businesses
            .into_iter()
            .filter(|b| {
                GeoPoint::new(b.latitude, b.longitude)
                    .map(|loc| loc.distance_km(&center) <= radius_km)
                    .unwrap_or(false)
            })
            .map(|b| b.owner_id)
            .collect();

        Ok(owner_ids)
    }
}
