//! DiscountResolver - Looks up the discount that applies to a user.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::Percentage;
use crate::domain::user::UserAccount;
use crate::ports::DiscountRepository;

/// Resolves a user's discount percentage.
///
/// A user without a discount pays full price. A user whose discount id
/// points at nothing is an integrity fault, never a silent 0%.
pub struct DiscountResolver {
    discounts: Arc<dyn DiscountRepository>,
}

impl DiscountResolver {
    pub fn new(discounts: Arc<dyn DiscountRepository>) -> Self {
        Self { discounts }
    }

    pub async fn resolve(&self, user: &UserAccount) -> Result<Percentage, BillingError> {
        let Some(discount_id) = user.discount_id else {
            return Ok(Percentage::ZERO);
        };

        match self.discounts.find_by_id(&discount_id).await? {
            Some(discount) => Ok(discount.percentage),
            None => {
                tracing::error!(
                    user_id = %user.id,
                    discount_id = %discount_id,
                    "User references a discount that does not exist"
                );
                Err(BillingError::discount_not_found(discount_id))
            }
        }
    }
}
