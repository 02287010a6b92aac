//! Fantastic Stories billing server.

use std::sync::Arc;

use fantastic_stories::adapters::http::{app_router, BillingAppState};
use fantastic_stories::adapters::postgres::{
    self, PostgresDiscountRepository, PostgresSubscriptionStore, PostgresUserRepository,
};
use fantastic_stories::adapters::{InMemoryBillingStore, SquareConfig, SquarePaymentProcessor};
use fantastic_stories::config::AppConfig;
use fantastic_stories::ports::PaymentProcessor;
use fantastic_stories::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    telemetry::init_tracing(&config.server);

    let processor: Arc<dyn PaymentProcessor> = Arc::new(SquarePaymentProcessor::new(
        SquareConfig::from_payment_config(&config.payment),
    ));

    let state = match &config.database {
        Some(database) => {
            let pool = postgres::connect(database).await?;
            BillingAppState::new(
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresDiscountRepository::new(pool.clone())),
                Arc::new(PostgresSubscriptionStore::new(pool)),
                processor,
            )
        }
        None => {
            tracing::warn!("No database configured; using in-memory storage");
            let store = InMemoryBillingStore::new();
            BillingAppState::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store),
                processor,
            )
        }
    };

    let app = app_router(state, &config.server);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        sandbox = config.payment.is_sandbox(),
        "Fantastic Stories billing server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
