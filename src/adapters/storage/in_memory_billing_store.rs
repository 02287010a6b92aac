//! In-Memory Billing Store Adapter
//!
//! Users, discounts and subscriptions behind one lock, implementing all three
//! store ports. Transactions are applied to a staged copy and swapped in on
//! commit, so a failure between their writes leaves nothing behind.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::billing::{Discount, DiscountCode, SubscriptionRecord, SubscriptionSummary};
use crate::domain::foundation::{
    BillingCustomerId, CardId, DiscountId, DomainError, ErrorCode, SubscriptionId, Timestamp,
    UserId,
};
use crate::domain::user::{PaymentCard, UserAccount};
use crate::ports::{DiscountRepository, SubscriptionStore, UserRepository};

#[derive(Debug, Clone, Default)]
struct BillingData {
    users: HashMap<UserId, UserAccount>,
    discounts: Vec<Discount>,
    subscriptions: HashMap<SubscriptionId, SubscriptionRecord>,
}

impl BillingData {
    fn user_mut(&mut self, id: &UserId) -> Result<&mut UserAccount, DomainError> {
        self.users
            .get_mut(id)
            .ok_or_else(|| user_not_found(id))
    }
}

/// In-memory implementation of the user, discount and subscription stores.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingStore {
    data: Arc<RwLock<BillingData>>,
    fail_between_writes: Arc<AtomicBool>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user record.
    pub async fn insert_user(&self, user: UserAccount) {
        self.data.write().await.users.insert(user.id.clone(), user);
    }

    /// Seed a discount record without the uniqueness check.
    pub async fn insert_discount(&self, discount: Discount) {
        self.data.write().await.discounts.push(discount);
    }

    /// Seed a subscription record.
    pub async fn insert_subscription(&self, record: SubscriptionRecord) {
        self.data
            .write()
            .await
            .subscriptions
            .insert(record.id.clone(), record);
    }

    /// Snapshot of a user record.
    pub async fn user(&self, id: &UserId) -> Option<UserAccount> {
        self.data.read().await.users.get(id).cloned()
    }

    /// Snapshot of a subscription record.
    pub async fn subscription(&self, id: &SubscriptionId) -> Option<SubscriptionRecord> {
        self.data.read().await.subscriptions.get(id).cloned()
    }

    pub async fn subscription_count(&self) -> usize {
        self.data.read().await.subscriptions.len()
    }

    /// Make the next transaction fail after its first write.
    pub fn fail_next_transaction(&self) {
        self.fail_between_writes.store(true, Ordering::SeqCst);
    }

    fn check_injected_fault(&self) -> Result<(), DomainError> {
        if self.fail_between_writes.swap(false, Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated failure between transaction writes",
            ));
        }
        Ok(())
    }
}

fn user_not_found(id: &UserId) -> DomainError {
    DomainError::new(ErrorCode::UserNotFound, format!("User {} not found", id))
}

#[async_trait]
impl UserRepository for InMemoryBillingStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, DomainError> {
        Ok(self.data.read().await.users.get(id).cloned())
    }

    async fn set_billing_customer_id_if_absent(
        &self,
        id: &UserId,
        customer_id: &BillingCustomerId,
    ) -> Result<BillingCustomerId, DomainError> {
        let mut data = self.data.write().await;
        let user = data.user_mut(id)?;
        Ok(user
            .billing_customer_id
            .get_or_insert_with(|| customer_id.clone())
            .clone())
    }

    async fn add_payment_card(&self, id: &UserId, card: &PaymentCard) -> Result<(), DomainError> {
        let mut data = self.data.write().await;
        data.user_mut(id)?.payment_cards.push(card.clone());
        Ok(())
    }

    async fn remove_payment_card(
        &self,
        id: &UserId,
        card_id: &CardId,
    ) -> Result<bool, DomainError> {
        let mut data = self.data.write().await;
        let user = data.user_mut(id)?;
        let before = user.payment_cards.len();
        user.payment_cards.retain(|c| &c.id != card_id);
        Ok(user.payment_cards.len() != before)
    }

    async fn set_discount(&self, id: &UserId, discount_id: &DiscountId) -> Result<(), DomainError> {
        let mut data = self.data.write().await;
        data.user_mut(id)?.discount_id = Some(*discount_id);
        Ok(())
    }
}

#[async_trait]
impl DiscountRepository for InMemoryBillingStore {
    async fn find_by_id(&self, id: &DiscountId) -> Result<Option<Discount>, DomainError> {
        let data = self.data.read().await;
        Ok(data.discounts.iter().find(|d| &d.id == id).cloned())
    }

    async fn find_by_code(&self, code: &DiscountCode) -> Result<Option<Discount>, DomainError> {
        let data = self.data.read().await;
        Ok(data.discounts.iter().find(|d| &d.code == code).cloned())
    }

    async fn save(&self, discount: &Discount) -> Result<(), DomainError> {
        let mut data = self.data.write().await;
        if data.discounts.iter().any(|d| d.code == discount.code) {
            return Err(DomainError::new(
                ErrorCode::DiscountCodeTaken,
                format!("Discount code {} already exists", discount.code),
            )
            .with_detail("code", discount.code.as_str()));
        }
        data.discounts.push(discount.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Discount>, DomainError> {
        Ok(self.data.read().await.discounts.clone())
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryBillingStore {
    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self.data.read().await.subscriptions.get(id).cloned())
    }

    async fn record_activation(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        let mut data = self.data.write().await;
        let mut staged = data.clone();

        let user = staged.user_mut(&record.user_id)?;
        if user.has_active_subscription() {
            return Err(DomainError::new(
                ErrorCode::SubscriptionAlreadyActive,
                format!("User {} already has an active subscription", record.user_id),
            ));
        }
        user.subscription = record.summary();
        user.subscription_generation += 1;

        self.check_injected_fault()?;

        staged
            .subscriptions
            .insert(record.id.clone(), record.clone());

        *data = staged;
        Ok(())
    }

    async fn record_cancellation(
        &self,
        user_id: &UserId,
        subscription_id: &SubscriptionId,
        canceled_date: Timestamp,
    ) -> Result<SubscriptionRecord, DomainError> {
        let mut data = self.data.write().await;
        let mut staged = data.clone();

        let record = staged.subscriptions.get_mut(subscription_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription {} not found", subscription_id),
            )
        })?;
        record.cancel(canceled_date).map_err(|e| {
            DomainError::new(ErrorCode::SubscriptionNotActive, e.to_string())
        })?;
        let updated = record.clone();

        self.check_injected_fault()?;

        staged.user_mut(user_id)?.subscription = SubscriptionSummary::empty();

        *data = staged;
        Ok(updated)
    }
}
