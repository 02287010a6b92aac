//! RemoveCardHandler - Command handler for deleting a card on file.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{CardId, UserId};
use crate::ports::{PaymentProcessor, UserRepository};

/// Command to remove one of a user's cards.
#[derive(Debug, Clone)]
pub struct RemoveCardCommand {
    pub user_id: UserId,
    pub card_id: CardId,
}

/// Handler for removing cards. Disables the card at the processor before
/// dropping it from the user.
pub struct RemoveCardHandler {
    users: Arc<dyn UserRepository>,
    processor: Arc<dyn PaymentProcessor>,
}

impl RemoveCardHandler {
    pub fn new(users: Arc<dyn UserRepository>, processor: Arc<dyn PaymentProcessor>) -> Self {
        Self { users, processor }
    }

    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, card_id = %cmd.card_id))]
    pub async fn handle(&self, cmd: RemoveCardCommand) -> Result<(), BillingError> {
        let user = self
            .users
            .find_by_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::user_not_found(cmd.user_id.clone()))?;

        if user.find_card(&cmd.card_id).is_none() {
            return Err(BillingError::card_not_found(cmd.card_id));
        }

        self.processor.disable_card(&cmd.card_id).await?;

        if !self
            .users
            .remove_payment_card(&cmd.user_id, &cmd.card_id)
            .await?
        {
            // Removed concurrently after the lookup above
            tracing::warn!("Card already gone when removing");
        }

        tracing::info!("Card removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::square::MockPaymentProcessor;
    use crate::adapters::storage::InMemoryBillingStore;
    use crate::domain::billing::ErrorKind;
    use crate::domain::user::{PaymentCard, UserAccount};

    fn user_id() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn card(id: &str) -> PaymentCard {
        PaymentCard {
            id: CardId::new(id).unwrap(),
            brand: Some("VISA".to_string()),
            last_4: Some("1111".to_string()),
            exp_month: Some(12),
            exp_year: Some(2030),
            cardholder_name: None,
        }
    }

    async fn setup() -> (RemoveCardHandler, InMemoryBillingStore, MockPaymentProcessor) {
        let store = InMemoryBillingStore::new();
        let mut user = UserAccount::new(user_id(), "reader@example.com");
        user.payment_cards = vec![card("card-1"), card("card-2")];
        store.insert_user(user).await;
        let processor = MockPaymentProcessor::new();
        let handler = RemoveCardHandler::new(Arc::new(store.clone()), Arc::new(processor.clone()));
        (handler, store, processor)
    }

    #[tokio::test]
    async fn disables_then_removes() {
        let (handler, store, processor) = setup().await;

        handler
            .handle(RemoveCardCommand {
                user_id: user_id(),
                card_id: CardId::new("card-1").unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(processor.calls()[0].args, vec!["card-1"]);
        let user = store.user(&user_id()).await.unwrap();
        assert_eq!(user.default_card().unwrap().id.as_str(), "card-2");
    }

    #[tokio::test]
    async fn unknown_card_is_not_found_without_processor_call() {
        let (handler, _, processor) = setup().await;

        let err = handler
            .handle(RemoveCardCommand {
                user_id: user_id(),
                card_id: CardId::new("card-9").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(processor.calls().is_empty());
    }

    #[tokio::test]
    async fn processor_failure_keeps_card() {
        let (handler, store, processor) = setup().await;
        processor.set_error(crate::ports::PaymentError::network("reset"));

        handler
            .handle(RemoveCardCommand {
                user_id: user_id(),
                card_id: CardId::new("card-1").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(store.user(&user_id()).await.unwrap().payment_cards.len(), 2);
    }
}
