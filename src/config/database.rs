//! Database configuration

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::error::ValidationError;

/// PostgreSQL connection settings.
///
/// The whole section is optional; without it the server keeps billing state
/// in memory, which is only allowed outside production.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply `migrations/` on startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: false,
        }
    }

    /// Pool options built from these settings.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE__URL"));
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > 100 {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_pool_defaults() {
        let config = DatabaseConfig::new("postgres://localhost/stories");
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 10);
        assert!(!config.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn url_must_be_postgres() {
        assert!(matches!(
            DatabaseConfig::new("mysql://localhost/stories").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
        assert!(matches!(
            DatabaseConfig::new("").validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn pool_bounds_are_checked() {
        let mut config = DatabaseConfig::new("postgresql://localhost/stories");
        config.min_connections = 20;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPoolSize)));

        config.min_connections = 1;
        config.max_connections = 150;
        assert!(matches!(config.validate(), Err(ValidationError::PoolSizeTooLarge)));

        config.max_connections = 0;
        config.min_connections = 0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPoolSize)));
    }
}
