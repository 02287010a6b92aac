//! PostgreSQL adapters - Database implementations for the billing store ports.
//!
//! - `PostgresUserRepository` - Billing columns of `users`
//! - `PostgresDiscountRepository` - `discounts`
//! - `PostgresSubscriptionStore` - `subscriptions`, transactional with `users`

mod discount_repository;
mod subscription_store;
mod user_repository;

pub use discount_repository::PostgresDiscountRepository;
pub use subscription_store::PostgresSubscriptionStore;
pub use user_repository::PostgresUserRepository;

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::config::DatabaseConfig;

/// Open the connection pool and, if configured, apply pending migrations.
#[instrument(skip(config), fields(max_connections = config.max_connections))]
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to PostgreSQL");
    let pool = config.pool_options().connect(&config.url).await?;

    if config.run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    info!("PostgreSQL connection pool established");
    Ok(pool)
}
