//! CustomerProvisioner - Ensures a user has a billing customer at the processor.

use std::sync::Arc;

use crate::application::UserLocks;
use crate::domain::billing::{BillingError, IdempotencyKey};
use crate::domain::foundation::{BillingCustomerId, UserId};
use crate::domain::user::UserAccount;
use crate::ports::{CreateCustomerRequest, PaymentProcessor, UserRepository};

/// Creates the processor customer for a user at most once.
///
/// Same-user calls are serialised by [`UserLocks`]; across processes the
/// deterministic idempotency key and the compare-and-set write converge on
/// one stored id.
pub struct CustomerProvisioner {
    users: Arc<dyn UserRepository>,
    processor: Arc<dyn PaymentProcessor>,
    locks: Arc<UserLocks>,
}

impl CustomerProvisioner {
    pub fn new(
        users: Arc<dyn UserRepository>,
        processor: Arc<dyn PaymentProcessor>,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            users,
            processor,
            locks,
        }
    }

    /// Returns the user's billing customer id, creating it if needed.
    pub async fn ensure_customer(&self, user_id: &UserId) -> Result<BillingCustomerId, BillingError> {
        let _guard = self.locks.acquire(user_id).await;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| BillingError::user_not_found(user_id.clone()))?;

        self.provision(&user).await
    }

    /// Same as [`ensure_customer`](Self::ensure_customer) for a caller that
    /// already holds the user's lock and has a fresh copy of the record.
    pub async fn provision(&self, user: &UserAccount) -> Result<BillingCustomerId, BillingError> {
        if let Some(existing) = &user.billing_customer_id {
            return Ok(existing.clone());
        }

        let created = self
            .processor
            .create_customer(CreateCustomerRequest {
                idempotency_key: IdempotencyKey::derive(
                    "customer",
                    "create_customer",
                    user.id.as_str(),
                ),
                user_id: user.id.clone(),
                email: user.email.clone(),
                given_name: user.first_name.clone(),
                family_name: user.last_name.clone(),
            })
            .await?;

        let stored = self
            .users
            .set_billing_customer_id_if_absent(&user.id, &created)
            .await?;

        if stored != created {
            tracing::warn!(
                user_id = %user.id,
                created = %created,
                stored = %stored,
                "Billing customer already set by a concurrent request"
            );
        } else {
            tracing::info!(user_id = %user.id, customer_id = %stored, "Created billing customer");
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::square::MockPaymentProcessor;
    use crate::adapters::storage::InMemoryBillingStore;
    use crate::domain::billing::ErrorKind;
    use crate::ports::PaymentError;

    fn user_id() -> UserId {
        UserId::new("user-1").unwrap()
    }

    async fn setup() -> (CustomerProvisioner, InMemoryBillingStore, MockPaymentProcessor) {
        let store = InMemoryBillingStore::new();
        store
            .insert_user(
                UserAccount::new(user_id(), "reader@example.com").with_name("Ada", "Lovelace"),
            )
            .await;
        let processor = MockPaymentProcessor::new();
        let provisioner = CustomerProvisioner::new(
            Arc::new(store.clone()),
            Arc::new(processor.clone()),
            Arc::new(UserLocks::new()),
        );
        (provisioner, store, processor)
    }

    #[tokio::test]
    async fn creates_customer_once_and_stores_it() {
        let (provisioner, store, processor) = setup().await;

        let first = provisioner.ensure_customer(&user_id()).await.unwrap();
        let second = provisioner.ensure_customer(&user_id()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(processor.call_count("create_customer"), 1);
        assert_eq!(
            store.user(&user_id()).await.unwrap().billing_customer_id,
            Some(first)
        );
    }

    #[tokio::test]
    async fn passes_user_details_to_processor() {
        let (provisioner, _store, processor) = setup().await;
        provisioner.ensure_customer(&user_id()).await.unwrap();

        let calls = processor.calls();
        assert_eq!(calls[0].args, vec!["user-1", "reader@example.com"]);
    }

    #[tokio::test]
    async fn concurrent_calls_create_one_customer() {
        let (provisioner, _store, processor) = setup().await;
        let provisioner = Arc::new(provisioner);

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let p = Arc::clone(&provisioner);
                tokio::spawn(async move { p.ensure_customer(&user_id()).await.unwrap() })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(processor.call_count("create_customer"), 1);
    }

    #[tokio::test]
    async fn stored_id_wins_over_new_one() {
        let (provisioner, store, _processor) = setup().await;
        let existing = BillingCustomerId::new("cust_existing").unwrap();
        store
            .set_billing_customer_id_if_absent(&user_id(), &existing)
            .await
            .unwrap();

        // Stale copy without the id, as a racing request would hold
        let stale = UserAccount::new(user_id(), "reader@example.com");
        let id = provisioner.provision(&stale).await.unwrap();

        assert_eq!(id, existing);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (provisioner, _store, processor) = setup().await;
        let err = provisioner
            .ensure_customer(&UserId::new("ghost").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!processor.was_called("create_customer"));
    }

    #[tokio::test]
    async fn processor_errors_surface_unchanged() {
        let (provisioner, store, processor) = setup().await;
        processor.set_error(PaymentError::single(
            401,
            "AUTHENTICATION_ERROR",
            "UNAUTHORIZED",
            None,
        ));

        let err = provisioner.ensure_customer(&user_id()).await.unwrap_err();

        assert!(matches!(err, BillingError::PaymentProcessor(ref e) if e.status == 401));
        assert!(store.user(&user_id()).await.unwrap().billing_customer_id.is_none());
    }
}
