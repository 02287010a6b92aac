//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `FANTASTIC_STORIES`
//! prefix and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use fantastic_stories::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::{PaymentConfig, SquareEnvironment, DEFAULT_SQUARE_API_VERSION};
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, logging, timeouts)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; absent means in-memory storage
    pub database: Option<DatabaseConfig>,

    /// Square payments processor
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `FANTASTIC_STORIES__*` variables:
    ///
    /// - `FANTASTIC_STORIES__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `FANTASTIC_STORIES__DATABASE__URL=...` -> `database.url = ...`
    /// - `FANTASTIC_STORIES__PAYMENT__SQUARE_ACCESS_TOKEN=...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FANTASTIC_STORIES")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Production additionally requires a database and the live Square
    /// environment.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.payment.validate()?;

        if self.is_production() {
            if self.database.is_none() {
                return Err(ValidationError::DatabaseRequiredInProduction);
            }
            if self.payment.is_sandbox() {
                return Err(ValidationError::SandboxInProduction);
            }
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
