//! GetDiscountedPriceHandler - Query handler for previewing a user's price.

use std::sync::Arc;

use crate::domain::billing::{price_for, BillingError, PlanType};
use crate::domain::foundation::{Percentage, UserId};
use crate::ports::{DiscountRepository, UserRepository};

use super::DiscountResolver;

/// Query for the price a user would pay for a plan.
#[derive(Debug, Clone)]
pub struct GetDiscountedPriceQuery {
    pub user_id: UserId,
    pub plan_type: PlanType,
}

/// Price preview in cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountedPrice {
    pub plan_type: PlanType,
    pub discount: Percentage,
    pub price_cents: u64,
}

/// Handler for the price preview. Prices exactly as subscribing would.
pub struct GetDiscountedPriceHandler {
    users: Arc<dyn UserRepository>,
    discounts: DiscountResolver,
}

impl GetDiscountedPriceHandler {
    pub fn new(users: Arc<dyn UserRepository>, discounts: Arc<dyn DiscountRepository>) -> Self {
        Self {
            users,
            discounts: DiscountResolver::new(discounts),
        }
    }

    pub async fn handle(&self, query: GetDiscountedPriceQuery) -> Result<DiscountedPrice, BillingError> {
        let user = self
            .users
            .find_by_id(&query.user_id)
            .await?
            .ok_or_else(|| BillingError::user_not_found(query.user_id.clone()))?;

        let discount = self.discounts.resolve(&user).await?;

        Ok(DiscountedPrice {
            plan_type: query.plan_type,
            discount,
            price_cents: price_for(query.plan_type, discount),
        })
    }
}
