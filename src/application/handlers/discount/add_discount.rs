//! AddDiscountHandler - Command handler for creating a discount code.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Discount, DiscountCode};
use crate::domain::foundation::Percentage;
use crate::ports::DiscountRepository;

/// Command to create a discount. Fields arrive unparsed from the client.
#[derive(Debug, Clone)]
pub struct AddDiscountCommand {
    pub code: String,
    pub percentage: String,
}

/// Handler for creating discounts.
pub struct AddDiscountHandler {
    discounts: Arc<dyn DiscountRepository>,
}

impl AddDiscountHandler {
    pub fn new(discounts: Arc<dyn DiscountRepository>) -> Self {
        Self { discounts }
    }

    pub async fn handle(&self, cmd: AddDiscountCommand) -> Result<Discount, BillingError> {
        let code = DiscountCode::new(cmd.code)?;
        let percentage = Percentage::parse(&cmd.percentage)?;

        let discount = Discount::new(code, percentage);
        self.discounts.save(&discount).await?;

        tracing::info!(
            discount_id = %discount.id,
            code = %discount.code,
            percentage = %discount.percentage,
            "Discount created"
        );
        Ok(discount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryBillingStore;
    use crate::domain::billing::ErrorKind;

    fn command(code: &str, percentage: &str) -> AddDiscountCommand {
        AddDiscountCommand {
            code: code.to_string(),
            percentage: percentage.to_string(),
        }
    }

    #[tokio::test]
    async fn creates_discount() {
        let store = InMemoryBillingStore::new();
        let handler = AddDiscountHandler::new(Arc::new(store.clone()));

        let discount = handler.handle(command("SPRING", "12.5")).await.unwrap();

        assert_eq!(discount.code.as_str(), "SPRING");
        assert_eq!(discount.percentage.basis_points(), 1250);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_out_of_range_percentage() {
        let handler = AddDiscountHandler::new(Arc::new(InMemoryBillingStore::new()));

        let err = handler.handle(command("TOO_MUCH", "101")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn rejects_blank_code() {
        let handler = AddDiscountHandler::new(Arc::new(InMemoryBillingStore::new()));

        let err = handler.handle(command("  ", "10")).await.unwrap_err();

        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let handler = AddDiscountHandler::new(Arc::new(InMemoryBillingStore::new()));
        handler.handle(command("SPRING", "10")).await.unwrap();

        let err = handler.handle(command("SPRING", "20")).await.unwrap_err();

        assert!(matches!(err, BillingError::DuplicateDiscountCode(ref c) if c == "SPRING"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
