use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub mod business_store;
pub mod engagement_store;
pub mod interaction_store;
pub mod post_store;
pub mod user_store;

pub use business_store::PgBusinessStore;
pub use engagement_store::PgEngagementStore;
pub use interaction_store::PgInteractionStore;
pub use post_store::PgPostStore;
pub use user_store::PgUserStore;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
