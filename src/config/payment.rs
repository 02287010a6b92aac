//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// `Square-Version` header sent when none is configured.
pub const DEFAULT_SQUARE_API_VERSION: &str = "2024-01-18";

/// Payment configuration (Square)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Square access token
    pub square_access_token: String,

    /// Square location that owns created subscriptions
    pub square_location_id: String,

    /// Sandbox or production API
    #[serde(default)]
    pub square_environment: SquareEnvironment,

    /// `Square-Version` header value
    #[serde(default = "default_api_version")]
    pub square_api_version: String,

    /// Overrides the environment's base URL (for local fakes)
    pub square_base_url: Option<String>,

    /// ISO 4217 currency for all prices
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Square API environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SquareEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl SquareEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            SquareEnvironment::Sandbox => "https://connect.squareupsandbox.com",
            SquareEnvironment::Production => "https://connect.squareup.com",
        }
    }
}

impl PaymentConfig {
    /// API base URL, honouring an explicit override.
    pub fn base_url(&self) -> String {
        self.square_base_url
            .clone()
            .unwrap_or_else(|| self.square_environment.base_url().to_string())
    }

    pub fn is_sandbox(&self) -> bool {
        self.square_environment == SquareEnvironment::Sandbox
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.square_access_token.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__SQUARE_ACCESS_TOKEN"));
        }
        if self.square_location_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__SQUARE_LOCATION_ID"));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }
        Ok(())
    }
}

fn default_api_version() -> String {
    DEFAULT_SQUARE_API_VERSION.to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PaymentConfig {
        PaymentConfig {
            square_access_token: "EAAA-token".to_string(),
            square_location_id: "L123".to_string(),
            square_environment: SquareEnvironment::Sandbox,
            square_api_version: default_api_version(),
            square_base_url: None,
            currency: default_currency(),
        }
    }

    #[test]
    fn sandbox_is_the_default_environment() {
        let config = valid_config();
        assert!(config.is_sandbox());
        assert_eq!(config.base_url(), "https://connect.squareupsandbox.com");
    }

    #[test]
    fn production_uses_live_host() {
        let config = PaymentConfig {
            square_environment: SquareEnvironment::Production,
            ..valid_config()
        };
        assert_eq!(config.base_url(), "https://connect.squareup.com");
    }

    #[test]
    fn base_url_override_wins() {
        let config = PaymentConfig {
            square_base_url: Some("http://127.0.0.1:9000".to_string()),
            ..valid_config()
        };
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn token_and_location_are_required() {
        let config = PaymentConfig {
            square_access_token: " ".to_string(),
            ..valid_config()
        };
        assert!(matches!(config.validate(), Err(ValidationError::MissingRequired(_))));

        let config = PaymentConfig {
            square_location_id: String::new(),
            ..valid_config()
        };
        assert!(matches!(config.validate(), Err(ValidationError::MissingRequired(_))));
    }

    #[test]
    fn currency_must_be_iso_code() {
        let config = PaymentConfig {
            currency: "usd".to_string(),
            ..valid_config()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidCurrency(_))));
        assert!(valid_config().validate().is_ok());
    }
}
