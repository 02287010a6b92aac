//! Plan types and the fixed catalog naming scheme.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the singleton subscription plan in the processor catalog.
pub const PLAN_NAME: &str = "stories_subscription";

/// Billing cadence a user can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    Weekly,
    Annual,
}

impl PlanType {
    /// All plan types, in catalog phase order.
    pub const ALL: [PlanType; 2] = [PlanType::Weekly, PlanType::Annual];

    /// Base price before discounts, in cents.
    pub fn base_price_cents(&self) -> u64 {
        match self {
            PlanType::Weekly => 100,
            PlanType::Annual => 3900,
        }
    }

    /// Cadence identifier understood by the processor.
    pub fn cadence(&self) -> &'static str {
        match self {
            PlanType::Weekly => "WEEKLY",
            PlanType::Annual => "ANNUAL",
        }
    }

    /// Number of billing periods in a variation phase.
    pub fn periods(&self) -> u32 {
        match self {
            PlanType::Weekly => 1,
            PlanType::Annual => 12,
        }
    }

    /// Deterministic catalog name of this cadence's plan variation.
    pub fn variation_name(&self) -> String {
        format!("{}_{}", PLAN_NAME, self.cadence().to_lowercase())
    }

    /// Parses a processor cadence string back into a plan type.
    pub fn from_cadence(cadence: &str) -> Option<Self> {
        match cadence {
            "WEEKLY" => Some(PlanType::Weekly),
            "ANNUAL" => Some(PlanType::Annual),
            _ => None,
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cadence())
    }
}

/// Error returned when a plan type string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlanType(pub String);

impl fmt::Display for UnknownPlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown plan type: {}", self.0)
    }
}

impl std::error::Error for UnknownPlanType {}

impl FromStr for PlanType {
    type Err = UnknownPlanType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(PlanType::Weekly),
            "ANNUAL" => Ok(PlanType::Annual),
            _ => Err(UnknownPlanType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_prices_are_fixed_per_cadence() {
        assert_eq!(PlanType::Weekly.base_price_cents(), 100);
        assert_eq!(PlanType::Annual.base_price_cents(), 3900);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("WEEKLY".parse::<PlanType>(), Ok(PlanType::Weekly));
        assert_eq!("annual".parse::<PlanType>(), Ok(PlanType::Annual));
    }

    #[test]
    fn rejects_unknown_cadence() {
        assert_eq!(
            "MONTHLY".parse::<PlanType>(),
            Err(UnknownPlanType("MONTHLY".to_string()))
        );
        assert!("".parse::<PlanType>().is_err());
    }

    #[test]
    fn variation_names_are_deterministic() {
        assert_eq!(PlanType::Weekly.variation_name(), "stories_subscription_weekly");
        assert_eq!(PlanType::Annual.variation_name(), "stories_subscription_annual");
    }

    #[test]
    fn periods_follow_cadence() {
        assert_eq!(PlanType::Weekly.periods(), 1);
        assert_eq!(PlanType::Annual.periods(), 12);
    }

    #[test]
    fn serializes_in_upper_case() {
        assert_eq!(serde_json::to_string(&PlanType::Annual).unwrap(), "\"ANNUAL\"");
    }
}
