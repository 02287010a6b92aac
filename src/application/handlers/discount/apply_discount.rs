//! ApplyDiscountHandler - Command handler for attaching a discount to a user.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Discount, DiscountCode};
use crate::domain::foundation::UserId;
use crate::ports::{DiscountRepository, UserRepository};

/// Command to apply a discount code to a user.
#[derive(Debug, Clone)]
pub struct ApplyDiscountCommand {
    pub user_id: UserId,
    pub code: String,
}

/// Handler for applying discount codes.
///
/// The discount affects the next subscription only; an active subscription
/// keeps its price.
pub struct ApplyDiscountHandler {
    users: Arc<dyn UserRepository>,
    discounts: Arc<dyn DiscountRepository>,
}

impl ApplyDiscountHandler {
    pub fn new(users: Arc<dyn UserRepository>, discounts: Arc<dyn DiscountRepository>) -> Self {
        Self { users, discounts }
    }

    pub async fn handle(&self, cmd: ApplyDiscountCommand) -> Result<Discount, BillingError> {
        let code = DiscountCode::new(cmd.code.clone())
            .map_err(|_| BillingError::invalid_discount_code(cmd.code.clone()))?;

        if self.users.find_by_id(&cmd.user_id).await?.is_none() {
            return Err(BillingError::user_not_found(cmd.user_id));
        }

        let discount = self
            .discounts
            .find_by_code(&code)
            .await?
            .ok_or_else(|| BillingError::invalid_discount_code(code.as_str()))?;

        self.users.set_discount(&cmd.user_id, &discount.id).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            discount_id = %discount.id,
            "Discount applied"
        );
        Ok(discount)
    }
}
