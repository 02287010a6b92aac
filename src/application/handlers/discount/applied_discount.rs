//! GetAppliedDiscountHandler - Query handler for the caller's applied discount.

use std::sync::Arc;

use crate::application::handlers::billing::DiscountResolver;
use crate::domain::billing::BillingError;
use crate::domain::foundation::{Percentage, UserId};
use crate::ports::{DiscountRepository, UserRepository};

/// Handler returning the percentage of the discount a user has applied.
pub struct GetAppliedDiscountHandler {
    users: Arc<dyn UserRepository>,
    resolver: DiscountResolver,
}

impl GetAppliedDiscountHandler {
    pub fn new(users: Arc<dyn UserRepository>, discounts: Arc<dyn DiscountRepository>) -> Self {
        Self {
            users,
            resolver: DiscountResolver::new(discounts),
        }
    }

    pub async fn handle(&self, user_id: &UserId) -> Result<Percentage, BillingError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| BillingError::user_not_found(user_id.clone()))?;

        if user.discount_id.is_none() {
            return Err(BillingError::no_discount_applied(user.id));
        }

        self.resolver.resolve(&user).await
    }
}
