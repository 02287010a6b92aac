//! Discount records and their redeemable codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DiscountId, Percentage, Timestamp, ValidationError};

const MAX_CODE_LENGTH: usize = 64;

/// Code a user enters to apply a discount. Unique across discounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiscountCode(String);

impl DiscountCode {
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err(ValidationError::empty_field("discount_code"));
        }
        if code.len() > MAX_CODE_LENGTH {
            return Err(ValidationError::invalid_format(
                "discount_code",
                format!("must be at most {} characters", MAX_CODE_LENGTH),
            ));
        }
        if code.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "discount_code",
                "must not contain whitespace",
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DiscountCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountCode> for String {
    fn from(code: DiscountCode) -> Self {
        code.0
    }
}

impl fmt::Display for DiscountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A percentage discount, owned independently of the users that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub code: DiscountCode,
    pub percentage: Percentage,
    pub created_at: Timestamp,
}

impl Discount {
    /// Creates a new discount with a fresh id.
    pub fn new(code: DiscountCode, percentage: Percentage) -> Self {
        Self {
            id: DiscountId::new(),
            code,
            percentage,
            created_at: Timestamp::now(),
        }
    }
}
