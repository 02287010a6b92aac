//! Percentage value object (0-100 with up to two decimal places).
//!
//! Stored as basis points so that pricing arithmetic stays exact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

const MAX_BASIS_POINTS: u16 = 10_000;

/// A percentage between 0 and 100 inclusive, at hundredth-of-a-percent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Percentage(u16);

impl Percentage {
    /// Zero percent.
    pub const ZERO: Self = Self(0);

    /// One hundred percent.
    pub const HUNDRED: Self = Self(MAX_BASIS_POINTS);

    /// Creates a Percentage from basis points (1/100 of a percent).
    pub fn from_basis_points(bp: u16) -> Result<Self, ValidationError> {
        if bp > MAX_BASIS_POINTS {
            return Err(ValidationError::out_of_range(
                "percentage",
                0,
                100,
                format_basis_points(bp),
            ));
        }
        Ok(Self(bp))
    }

    /// Parses a decimal string such as `"50"`, `"12.5"` or `"0.05"`.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::empty_field("percentage"));
        }
        if value.starts_with('-') {
            return Err(ValidationError::out_of_range("percentage", 0, 100, value));
        }

        let (whole, fraction) = match value.split_once('.') {
            Some((w, f)) => (w, f),
            None => (value, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(ValidationError::invalid_format("percentage", "not a number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ValidationError::invalid_format("percentage", "not a number"));
        }
        if fraction.len() > 2 {
            return Err(ValidationError::invalid_format(
                "percentage",
                "at most two decimal places are allowed",
            ));
        }

        let whole: u32 = if whole.is_empty() {
            0
        } else {
            // Anything longer than three digits is out of range anyway.
            if whole.trim_start_matches('0').len() > 3 {
                return Err(ValidationError::out_of_range("percentage", 0, 100, value));
            }
            whole
                .parse()
                .map_err(|_| ValidationError::invalid_format("percentage", "not a number"))?
        };
        let fraction: u32 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u32>().unwrap_or(0) * 10,
            _ => fraction.parse::<u32>().unwrap_or(0),
        };

        let bp = whole * 100 + fraction;
        if bp > u32::from(MAX_BASIS_POINTS) {
            return Err(ValidationError::out_of_range("percentage", 0, 100, value));
        }
        Ok(Self(bp as u16))
    }

    /// Returns the value in basis points.
    pub fn basis_points(&self) -> u16 {
        self.0
    }

    /// Returns true for 0%.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for Percentage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Percentage {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Percentage> for String {
    fn from(p: Percentage) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_basis_points(self.0))
    }
}

fn format_basis_points(bp: u16) -> String {
    let whole = bp / 100;
    let fraction = bp % 100;
    match fraction {
        0 => whole.to_string(),
        f if f % 10 == 0 => format!("{}.{}", whole, f / 10),
        f => format!("{}.{:02}", whole, f),
    }
}
