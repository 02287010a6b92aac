//! ListDiscountsHandler - Query handler for all discounts.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Discount};
use crate::ports::DiscountRepository;

pub struct ListDiscountsHandler {
    discounts: Arc<dyn DiscountRepository>,
}

impl ListDiscountsHandler {
    pub fn new(discounts: Arc<dyn DiscountRepository>) -> Self {
        Self { discounts }
    }

    /// All discounts, oldest first. An empty list is `NoDiscounts`.
    pub async fn handle(&self) -> Result<Vec<Discount>, BillingError> {
        let discounts = self.discounts.list().await?;
        if discounts.is_empty() {
            return Err(BillingError::NoDiscounts);
        }
        Ok(discounts)
    }
}
