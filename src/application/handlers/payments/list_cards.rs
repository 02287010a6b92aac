//! ListCardsHandler - Query handler for a user's cards on file.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::UserId;
use crate::domain::user::PaymentCard;
use crate::ports::UserRepository;

pub struct ListCardsHandler {
    users: Arc<dyn UserRepository>,
}

impl ListCardsHandler {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Cards in stored order; the first is the default.
    pub async fn handle(&self, user_id: &UserId) -> Result<Vec<PaymentCard>, BillingError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| BillingError::user_not_found(user_id.clone()))?;
        Ok(user.payment_cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryBillingStore;
    use crate::domain::user::UserAccount;

    #[tokio::test]
    async fn new_user_has_no_cards() {
        let store = InMemoryBillingStore::new();
        let id = UserId::new("user-1").unwrap();
        store.insert_user(UserAccount::new(id.clone(), "r@example.com")).await;

        let cards = ListCardsHandler::new(Arc::new(store)).handle(&id).await.unwrap();

        assert!(cards.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let handler = ListCardsHandler::new(Arc::new(InMemoryBillingStore::new()));

        let err = handler
            .handle(&UserId::new("ghost").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::UserNotFound(_)));
    }
}
