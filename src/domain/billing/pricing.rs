//! Discounted price computation.
//!
//! `adjusted = base - base * d / 100`, evaluated exactly over basis points
//! and rounded half-to-even to whole cents. The preview endpoint and the
//! subscription workflow both price through [`price_for`].

use crate::domain::foundation::Percentage;

use super::PlanType;

const BASIS_POINTS_PER_WHOLE: u128 = 10_000;

/// Applies a discount to a base amount in cents.
pub fn compute_price(base_cents: u64, discount: Percentage) -> u64 {
    let keep = BASIS_POINTS_PER_WHOLE - u128::from(discount.basis_points());
    let numerator = u128::from(base_cents) * keep;

    let quotient = numerator / BASIS_POINTS_PER_WHOLE;
    let remainder = numerator % BASIS_POINTS_PER_WHOLE;
    let half = BASIS_POINTS_PER_WHOLE / 2;

    let rounded = if remainder > half || (remainder == half && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };

    // Never exceeds base_cents, so the narrowing is lossless.
    rounded as u64
}

/// Discounted price of a plan, in cents.
pub fn price_for(plan_type: PlanType, discount: Percentage) -> u64 {
    compute_price(plan_type.base_price_cents(), discount)
}
