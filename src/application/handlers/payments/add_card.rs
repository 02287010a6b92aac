//! AddCardHandler - Command handler for storing a card on file.

use std::sync::Arc;

use crate::domain::billing::{BillingError, IdempotencyKey};
use crate::domain::foundation::UserId;
use crate::domain::user::PaymentCard;
use crate::ports::{CreateCardRequest, PaymentProcessor, UserRepository};

use crate::application::handlers::billing::CustomerProvisioner;

/// Command to store a card from a client-side card nonce.
#[derive(Debug, Clone)]
pub struct AddCardCommand {
    pub user_id: UserId,
    pub nonce: String,
    pub cardholder_name: Option<String>,
}

/// Handler for adding cards.
///
/// Provisions the billing customer first, then creates the card at the
/// processor and appends it to the user's cards.
pub struct AddCardHandler {
    users: Arc<dyn UserRepository>,
    processor: Arc<dyn PaymentProcessor>,
    customers: Arc<CustomerProvisioner>,
}

impl AddCardHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        processor: Arc<dyn PaymentProcessor>,
        customers: Arc<CustomerProvisioner>,
    ) -> Self {
        Self {
            users,
            processor,
            customers,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id))]
    pub async fn handle(&self, cmd: AddCardCommand) -> Result<PaymentCard, BillingError> {
        let nonce = cmd.nonce.trim();
        if nonce.is_empty() {
            return Err(BillingError::validation("nonce", "Card nonce is required"));
        }

        let customer_id = self.customers.ensure_customer(&cmd.user_id).await?;

        let card = self
            .processor
            .create_card(CreateCardRequest {
                idempotency_key: IdempotencyKey::derive(
                    cmd.user_id.as_str(),
                    "create_card",
                    nonce,
                ),
                customer_id,
                source_id: nonce.to_string(),
                cardholder_name: cmd.cardholder_name,
            })
            .await?;

        self.users.add_payment_card(&cmd.user_id, &card).await?;

        tracing::info!(card_id = %card.id, "Card added");
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::square::MockPaymentProcessor;
    use crate::adapters::storage::InMemoryBillingStore;
    use crate::application::UserLocks;
    use crate::domain::billing::ErrorKind;
    use crate::domain::user::UserAccount;
    use crate::ports::PaymentError;

    fn user_id() -> UserId {
        UserId::new("user-1").unwrap()
    }

    async fn setup() -> (AddCardHandler, InMemoryBillingStore, MockPaymentProcessor) {
        let store = InMemoryBillingStore::new();
        store
            .insert_user(UserAccount::new(user_id(), "reader@example.com"))
            .await;
        let processor = MockPaymentProcessor::new();
        let customers = Arc::new(CustomerProvisioner::new(
            Arc::new(store.clone()),
            Arc::new(processor.clone()),
            Arc::new(UserLocks::new()),
        ));
        let handler = AddCardHandler::new(
            Arc::new(store.clone()),
            Arc::new(processor.clone()),
            customers,
        );
        (handler, store, processor)
    }

    fn command(nonce: &str) -> AddCardCommand {
        AddCardCommand {
            user_id: user_id(),
            nonce: nonce.to_string(),
            cardholder_name: Some("Ada Lovelace".to_string()),
        }
    }

    #[tokio::test]
    async fn provisions_customer_then_stores_card() {
        let (handler, store, processor) = setup().await;

        let card = handler.handle(command("cnon:card-nonce-ok")).await.unwrap();

        let calls = processor.calls();
        assert_eq!(calls[0].method, "create_customer");
        assert_eq!(calls[1].method, "create_card");
        assert_eq!(calls[1].args[1], "cnon:card-nonce-ok");

        let user = store.user(&user_id()).await.unwrap();
        assert_eq!(user.payment_cards, vec![card]);
        assert!(user.billing_customer_id.is_some());
    }

    #[tokio::test]
    async fn second_card_reuses_customer() {
        let (handler, store, processor) = setup().await;

        handler.handle(command("cnon:first")).await.unwrap();
        handler.handle(command("cnon:second")).await.unwrap();

        assert_eq!(processor.call_count("create_customer"), 1);
        assert_eq!(store.user(&user_id()).await.unwrap().payment_cards.len(), 2);
    }

    #[tokio::test]
    async fn blank_nonce_is_rejected_before_processor() {
        let (handler, _, processor) = setup().await;

        let err = handler.handle(command("  ")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(processor.calls().is_empty());
    }

    #[tokio::test]
    async fn declined_card_is_not_stored() {
        let (handler, store, processor) = setup().await;
        processor.set_method_error(
            "create_card",
            PaymentError::single(400, "INVALID_REQUEST_ERROR", "INVALID_CARD", None),
        );

        let err = handler.handle(command("cnon:bad")).await.unwrap_err();

        assert!(matches!(err, BillingError::PaymentProcessor(ref e) if e.status == 400));
        assert!(store.user(&user_id()).await.unwrap().payment_cards.is_empty());
    }
}
