//! CancelSubscriptionHandler - Command handler for cancelling the active subscription.

use std::sync::Arc;

use crate::application::UserLocks;
use crate::domain::billing::{BillingError, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::ports::{PaymentProcessor, SubscriptionStore, UserRepository};

/// Command to cancel a user's subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub user_id: UserId,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: SubscriptionRecord,
}

/// Handler for cancelling subscriptions.
///
/// Only an ACTIVE subscription can be cancelled. Local state changes only
/// after the processor confirms the cancellation, and then both the record
/// and the user summary change in one transaction.
pub struct CancelSubscriptionHandler {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn SubscriptionStore>,
    processor: Arc<dyn PaymentProcessor>,
    locks: Arc<UserLocks>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        store: Arc<dyn SubscriptionStore>,
        processor: Arc<dyn PaymentProcessor>,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            users,
            store,
            processor,
            locks,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id))]
    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, BillingError> {
        let _guard = self.locks.acquire(&cmd.user_id).await;

        let user = self
            .users
            .find_by_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::user_not_found(cmd.user_id.clone()))?;

        if !user.subscription.is_active() {
            return Err(BillingError::not_active(
                user.id.clone(),
                user.subscription.status,
            ));
        }

        let subscription_id = user
            .subscription
            .subscription_id
            .clone()
            .ok_or_else(|| BillingError::no_subscription_recorded(user.id.clone()))?;

        if self.store.find_by_id(&subscription_id).await?.is_none() {
            tracing::error!(
                subscription_id = %subscription_id,
                "User summary points at a missing subscription record"
            );
            return Err(BillingError::subscription_record_not_found(subscription_id));
        }

        let canceled = self
            .processor
            .cancel_subscription(&subscription_id)
            .await?;
        let canceled_date = canceled.canceled_date.unwrap_or_else(Timestamp::now);

        let record = self
            .store
            .record_cancellation(&user.id, &subscription_id, canceled_date)
            .await
            .map_err(|err| {
                tracing::error!(
                    subscription_id = %subscription_id,
                    error = %err,
                    "reconciliation gap: processor subscription cancelled but not persisted"
                );
                cancellation_error(err, &user.id, &subscription_id)
            })?;

        tracing::info!(subscription_id = %record.id, "Subscription cancelled");

        Ok(CancelSubscriptionResult {
            subscription: record,
        })
    }
}

fn cancellation_error(
    err: DomainError,
    user_id: &UserId,
    subscription_id: &SubscriptionId,
) -> BillingError {
    match err.code {
        ErrorCode::SubscriptionNotFound => {
            BillingError::subscription_record_not_found(subscription_id.clone())
        }
        ErrorCode::SubscriptionNotActive => BillingError::not_active(
            user_id.clone(),
            SubscriptionStatus::Cancelled,
        ),
        ErrorCode::UserNotFound => BillingError::user_not_found(user_id.clone()),
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::square::MockPaymentProcessor;
    use crate::adapters::storage::InMemoryBillingStore;
    use crate::domain::billing::{
        ErrorKind, PlanType, SubscriptionSummary,
    };
    use crate::domain::foundation::{BillingCustomerId, CardId, PlanId, PlanVariationId};
    use crate::domain::user::UserAccount;
    use crate::ports::{ProcessorSubscription, ProcessorSubscriptionStatus};

    fn user_id() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn sub_id() -> SubscriptionId {
        SubscriptionId::new("sub-1").unwrap()
    }

    fn record() -> SubscriptionRecord {
        let now = Timestamp::now();
        SubscriptionRecord {
            id: sub_id(),
            user_id: user_id(),
            plan_type: PlanType::Weekly,
            billing_customer_id: BillingCustomerId::new("cust-1").unwrap(),
            plan_id: PlanId::new("plan-1").unwrap(),
            plan_variation_id: PlanVariationId::new("var-1").unwrap(),
            card_id: CardId::new("card-1").unwrap(),
            price_cents: 100,
            status: SubscriptionStatus::Active,
            created_at: now,
            start_date: now,
            canceled_date: None,
        }
    }

    struct Fixture {
        handler: CancelSubscriptionHandler,
        store: InMemoryBillingStore,
        processor: MockPaymentProcessor,
    }

    async fn fixture(summary: SubscriptionSummary, with_record: bool) -> Fixture {
        let store = InMemoryBillingStore::new();
        let mut user = UserAccount::new(user_id(), "reader@example.com");
        user.subscription = summary;
        store.insert_user(user).await;
        if with_record {
            store.insert_subscription(record()).await;
        }

        let processor = MockPaymentProcessor::new();
        processor.add_subscription(ProcessorSubscription {
            id: sub_id(),
            status: ProcessorSubscriptionStatus::Active,
            created_at: None,
            start_date: None,
            canceled_date: None,
        });

        let handler = CancelSubscriptionHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(processor.clone()),
            Arc::new(UserLocks::new()),
        );
        Fixture {
            handler,
            store,
            processor,
        }
    }

    fn command() -> CancelSubscriptionCommand {
        CancelSubscriptionCommand { user_id: user_id() }
    }

    fn active() -> SubscriptionSummary {
        SubscriptionSummary::new(sub_id(), SubscriptionStatus::Active)
    }

    #[tokio::test]
    async fn cancels_and_clears_user_summary() {
        let f = fixture(active(), true).await;

        let result = f.handler.handle(command()).await.unwrap();

        assert_eq!(result.subscription.status, SubscriptionStatus::Cancelled);
        assert!(result.subscription.canceled_date.is_some());
        let user = f.store.user(&user_id()).await.unwrap();
        assert_eq!(user.subscription, SubscriptionSummary::empty());
        assert_eq!(
            f.store.subscription(&sub_id()).await.unwrap().status,
            SubscriptionStatus::Cancelled
        );
        assert_eq!(f.processor.call_count("cancel_subscription"), 1);
    }

    #[tokio::test]
    async fn processor_canceled_date_is_recorded() {
        let f = fixture(active(), true).await;
        let date = Timestamp::now();
        f.processor.set_canceled_date(date);

        let result = f.handler.handle(command()).await.unwrap();

        assert_eq!(result.subscription.canceled_date, Some(date));
    }

    #[tokio::test]
    async fn inactive_subscription_is_rejected_without_mutation() {
        let f = fixture(SubscriptionSummary::empty(), true).await;

        let err = f.handler.handle(command()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.error_code(), "SUBSCRIPTION_NOT_ACTIVE");
        assert!(f.processor.calls().is_empty());
        assert_eq!(
            f.store.subscription(&sub_id()).await.unwrap().status,
            SubscriptionStatus::Active
        );
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let f = fixture(active(), false).await;

        let err = f.handler.handle(command()).await.unwrap_err();

        assert!(matches!(err, BillingError::SubscriptionRecordNotFound(_)));
        assert!(f.processor.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let f = fixture(active(), true).await;

        let err = f
            .handler
            .handle(CancelSubscriptionCommand {
                user_id: UserId::new("ghost").unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn processor_rejection_leaves_local_state_untouched() {
        let f = fixture(active(), true).await;
        f.processor.set_error(crate::ports::PaymentError::single(
            400,
            "INVALID_REQUEST_ERROR",
            "BAD_REQUEST",
            None,
        ));

        let err = f.handler.handle(command()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ExternalProcessor);
        assert!(f.store.user(&user_id()).await.unwrap().has_active_subscription());
    }

    #[tokio::test]
    async fn failed_transaction_commits_neither_write() {
        let f = fixture(active(), true).await;
        f.store.fail_next_transaction();

        let err = f.handler.handle(command()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(f.store.user(&user_id()).await.unwrap().has_active_subscription());
        assert_eq!(
            f.store.subscription(&sub_id()).await.unwrap().status,
            SubscriptionStatus::Active
        );
    }
}
