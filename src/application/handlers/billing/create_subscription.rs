//! CreateSubscriptionHandler - Command handler for starting a recurring subscription.
//!
//! Runs the subscription workflow:
//!
//! ```text
//! Requested ─► PlanReady ─► VariationReady ─► Submitted ─► Persisted
//! ```
//!
//! Every local precondition is checked before the first processor call.

use std::sync::Arc;

use crate::application::UserLocks;
use crate::domain::billing::{
    price_for, BillingError, ErrorKind, IdempotencyKey, PlanType, SubscriptionRecord, SubscriptionStage,
    SubscriptionStatus, SubscriptionWorkflow,
};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{
    CreateSubscriptionRequest, DiscountRepository, PaymentProcessor, SubscriptionStore,
    UserRepository,
};

use super::{CustomerProvisioner, DiscountResolver, PlanCatalogManager};

/// Command to subscribe a user to a plan.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub user_id: UserId,
    pub plan_type: PlanType,
}

/// Result of a successful subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: SubscriptionRecord,
    pub stage: SubscriptionStage,
}

/// Handler for creating subscriptions.
pub struct CreateSubscriptionHandler {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn SubscriptionStore>,
    processor: Arc<dyn PaymentProcessor>,
    locks: Arc<UserLocks>,
    discounts: DiscountResolver,
    customers: CustomerProvisioner,
    catalog: PlanCatalogManager,
}

impl CreateSubscriptionHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        discounts: Arc<dyn DiscountRepository>,
        store: Arc<dyn SubscriptionStore>,
        processor: Arc<dyn PaymentProcessor>,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            discounts: DiscountResolver::new(discounts),
            customers: CustomerProvisioner::new(
                users.clone(),
                processor.clone(),
                locks.clone(),
            ),
            catalog: PlanCatalogManager::new(processor.clone()),
            users,
            store,
            processor,
            locks,
        }
    }

    #[tracing::instrument(
        skip(self, cmd),
        fields(user_id = %cmd.user_id, plan_type = %cmd.plan_type)
    )]
    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, BillingError> {
        let _guard = self.locks.acquire(&cmd.user_id).await;

        let mut workflow = SubscriptionWorkflow::start();
        let result = self.run(&mut workflow, &cmd).await;

        result.map_err(|err| {
            let stage = workflow.fail();
            match err.kind() {
                ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Conflict => {
                    tracing::info!(%stage, error = %err, "Subscription rejected");
                }
                _ => tracing::error!(%stage, error = %err, "Subscription failed"),
            }
            err.at_stage(stage)
        })
    }

    async fn run(
        &self,
        workflow: &mut SubscriptionWorkflow,
        cmd: &CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, BillingError> {
        // 1. Local checks
        let user = self
            .users
            .find_by_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::user_not_found(cmd.user_id.clone()))?;

        if user.has_active_subscription() {
            return Err(BillingError::already_subscribed(user.id.clone()));
        }

        let card_id = user
            .default_card()
            .map(|card| card.id.clone())
            .ok_or_else(|| BillingError::no_card_on_file(user.id.clone()))?;

        let discount = self.discounts.resolve(&user).await?;
        let price_cents = price_for(cmd.plan_type, discount);

        // 2. Processor prerequisites
        let customer_id = self.customers.provision(&user).await?;

        let plan_id = self.catalog.ensure_plan().await?;
        advance(workflow, SubscriptionStage::PlanReady)?;

        let plan_variation_id = self.catalog.ensure_variation(&plan_id, cmd.plan_type).await?;
        advance(workflow, SubscriptionStage::VariationReady)?;

        // 3. Submit
        let idempotency_key = IdempotencyKey::derive(
            user.id.as_str(),
            "create_subscription",
            &format!(
                "{}/{}/{}/{}",
                cmd.plan_type, price_cents, card_id, user.subscription_generation
            ),
        );

        let created = self
            .processor
            .create_subscription(CreateSubscriptionRequest {
                idempotency_key,
                customer_id: customer_id.clone(),
                plan_variation_id: plan_variation_id.clone(),
                card_id: card_id.clone(),
                price_override_cents: price_cents,
            })
            .await?;
        advance(workflow, SubscriptionStage::Submitted)?;

        let status = created.status.to_local().ok_or_else(|| {
            BillingError::unexpected_response(format!(
                "subscription {} has unknown status {:?}",
                created.id, created.status
            ))
        })?;
        if status != SubscriptionStatus::Active {
            return Err(BillingError::unexpected_response(format!(
                "new subscription {} is already {}",
                created.id, status
            )));
        }

        // 4. Persist both records in one transaction
        let now = Timestamp::now();
        let record = SubscriptionRecord {
            id: created.id.clone(),
            user_id: user.id.clone(),
            plan_type: cmd.plan_type,
            billing_customer_id: customer_id,
            plan_id,
            plan_variation_id,
            card_id,
            price_cents,
            status,
            created_at: created.created_at.unwrap_or(now),
            start_date: created.start_date.unwrap_or(now),
            canceled_date: None,
        };

        if let Err(err) = self.store.record_activation(&record).await {
            tracing::error!(
                subscription_id = %record.id,
                error = %err,
                "reconciliation gap: processor subscription created but not persisted"
            );
            return Err(activation_error(err, &user.id));
        }
        advance(workflow, SubscriptionStage::Persisted)?;

        tracing::info!(
            subscription_id = %record.id,
            price_cents,
            "Subscription created"
        );

        Ok(CreateSubscriptionResult {
            subscription: record,
            stage: workflow.stage(),
        })
    }
}

fn advance(workflow: &mut SubscriptionWorkflow, target: SubscriptionStage) -> Result<(), BillingError> {
    workflow
        .advance(target)
        .map_err(|e| BillingError::infrastructure(format!("workflow transition: {}", e)))
}

fn activation_error(err: DomainError, user_id: &UserId) -> BillingError {
    match err.code {
        ErrorCode::SubscriptionAlreadyActive => BillingError::already_subscribed(user_id.clone()),
        ErrorCode::UserNotFound => BillingError::user_not_found(user_id.clone()),
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::square::MockPaymentProcessor;
    use crate::adapters::storage::InMemoryBillingStore;
    use crate::domain::billing::{Discount, DiscountCode, WorkflowStep};
    use crate::domain::foundation::{CardId, DiscountId, Percentage};
    use crate::domain::user::{PaymentCard, UserAccount};
    use crate::ports::{PaymentError, ProcessorSubscriptionStatus};

    fn user_id() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn card() -> PaymentCard {
        PaymentCard {
            id: CardId::new("card-1").unwrap(),
            brand: Some("VISA".to_string()),
            last_4: Some("1111".to_string()),
            exp_month: Some(12),
            exp_year: Some(2030),
            cardholder_name: None,
        }
    }

    struct Fixture {
        handler: CreateSubscriptionHandler,
        store: InMemoryBillingStore,
        processor: MockPaymentProcessor,
    }

    async fn fixture(user: UserAccount) -> Fixture {
        let store = InMemoryBillingStore::new();
        store.insert_user(user).await;
        let processor = MockPaymentProcessor::new();
        let handler = CreateSubscriptionHandler::new(
            Arc::new(store.clone()),
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

    fn user_with_card() -> UserAccount {
        let mut user = UserAccount::new(user_id(), "reader@example.com");
        user.payment_cards.push(card());
        user
    }

    fn command(plan_type: PlanType) -> CreateSubscriptionCommand {
        CreateSubscriptionCommand {
            user_id: user_id(),
            plan_type,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Happy path
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn weekly_without_discount_charges_base_price() {
        let f = fixture(user_with_card()).await;

        let result = f.handler.handle(command(PlanType::Weekly)).await.unwrap();

        assert_eq!(result.stage, SubscriptionStage::Persisted);
        assert_eq!(result.subscription.price_cents, 100);
        let calls = f.processor.calls();
        let submit = calls
            .iter()
            .find(|c| c.method == "create_subscription")
            .unwrap();
        assert_eq!(submit.args[2], "card-1");
        assert_eq!(submit.args[3], "100");
    }

    #[tokio::test]
    async fn half_off_annual_charges_1950() {
        let discount = Discount::new(
            DiscountCode::new("HALF").unwrap(),
            Percentage::parse("50").unwrap(),
        );
        let mut user = user_with_card();
        user.discount_id = Some(discount.id);
        let f = fixture(user).await;
        f.store.insert_discount(discount).await;

        let result = f.handler.handle(command(PlanType::Annual)).await.unwrap();

        assert_eq!(result.subscription.price_cents, 1950);
    }

    #[tokio::test]
    async fn success_persists_both_records() {
        let f = fixture(user_with_card()).await;

        let result = f.handler.handle(command(PlanType::Annual)).await.unwrap();

        let user = f.store.user(&user_id()).await.unwrap();
        assert!(user.has_active_subscription());
        assert_eq!(
            user.subscription.subscription_id,
            Some(result.subscription.id.clone())
        );
        assert!(user.billing_customer_id.is_some());
        assert_eq!(
            f.store.subscription(&result.subscription.id).await,
            Some(result.subscription)
        );
    }

    #[tokio::test]
    async fn second_subscription_reuses_catalog_objects() {
        let f = fixture(user_with_card()).await;
        f.handler.handle(command(PlanType::Weekly)).await.unwrap();

        // A second user subscribing to the same cadence
        let mut other = UserAccount::new(UserId::new("user-2").unwrap(), "b@example.com");
        other.payment_cards.push(card());
        f.store.insert_user(other).await;
        f.handler
            .handle(CreateSubscriptionCommand {
                user_id: UserId::new("user-2").unwrap(),
                plan_type: PlanType::Weekly,
            })
            .await
            .unwrap();

        assert_eq!(f.processor.call_count("upsert_catalog_object"), 2);
        assert_eq!(f.processor.call_count("create_customer"), 2);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Local preconditions: no processor calls
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let f = fixture(user_with_card()).await;

        let err = f
            .handler
            .handle(CreateSubscriptionCommand {
                user_id: UserId::new("ghost").unwrap(),
                plan_type: PlanType::Weekly,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(f.processor.calls().is_empty());
    }

    #[tokio::test]
    async fn already_active_is_conflict_without_processor_calls() {
        let f = fixture(user_with_card()).await;
        f.handler.handle(command(PlanType::Weekly)).await.unwrap();
        f.processor.clear_calls();

        let err = f.handler.handle(command(PlanType::Annual)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.error_code(), "ALREADY_SUBSCRIBED");
        assert!(f.processor.calls().is_empty());
    }

    #[tokio::test]
    async fn no_card_fails_before_processor() {
        let f = fixture(UserAccount::new(user_id(), "reader@example.com")).await;

        let err = f.handler.handle(command(PlanType::Weekly)).await.unwrap_err();

        assert!(matches!(err.root(), BillingError::NoCardOnFile(_)));
        assert!(f.processor.calls().is_empty());
        assert_eq!(f.store.subscription_count().await, 0);
    }

    #[tokio::test]
    async fn dangling_discount_fails_before_processor() {
        let mut user = user_with_card();
        user.discount_id = Some(DiscountId::new());
        let f = fixture(user).await;

        let err = f.handler.handle(command(PlanType::Weekly)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(f.processor.calls().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failures after processor calls
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn declined_submission_records_failed_stage() {
        let f = fixture(user_with_card()).await;
        f.processor.set_method_error(
            "create_subscription",
            PaymentError::single(402, "PAYMENT_METHOD_ERROR", "CARD_DECLINED", None),
        );

        let err = f.handler.handle(command(PlanType::Weekly)).await.unwrap_err();

        assert!(matches!(
            err,
            BillingError::WorkflowFailed {
                stage: SubscriptionStage::Failed {
                    at: WorkflowStep::VariationReady
                },
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::ExternalProcessor);
        assert!(!f.store.user(&user_id()).await.unwrap().has_active_subscription());
    }

    #[tokio::test]
    async fn plan_lookup_failure_is_attributed_to_requested() {
        let f = fixture(user_with_card()).await;
        f.processor
            .set_method_error("list_catalog", PaymentError::network("timeout"));

        let err = f.handler.handle(command(PlanType::Weekly)).await.unwrap_err();

        assert!(matches!(
            err,
            BillingError::WorkflowFailed {
                stage: SubscriptionStage::Failed {
                    at: WorkflowStep::Requested
                },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn persist_failure_leaves_no_local_state_and_retry_converges() {
        let f = fixture(user_with_card()).await;
        f.store.fail_next_transaction();

        let err = f.handler.handle(command(PlanType::Weekly)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(matches!(
            err,
            BillingError::WorkflowFailed {
                stage: SubscriptionStage::Failed {
                    at: WorkflowStep::Submitted
                },
                ..
            }
        ));
        assert_eq!(f.store.subscription_count().await, 0);

        // Same generation, same key: the processor replays the same subscription
        let retried = f.handler.handle(command(PlanType::Weekly)).await.unwrap();
        let submitted: Vec<_> = f
            .processor
            .calls()
            .into_iter()
            .filter(|c| c.method == "create_subscription")
            .collect();
        assert_eq!(submitted.len(), 2);
        assert!(f.processor.subscription(&retried.subscription.id).is_some());
        assert_eq!(f.processor.subscription_count(), 1);
        assert_eq!(f.store.subscription_count().await, 1);
    }

    #[tokio::test]
    async fn retry_with_a_different_card_submits_a_new_subscription() {
        let f = fixture(user_with_card()).await;
        f.store.fail_next_transaction();
        f.handler.handle(command(PlanType::Weekly)).await.unwrap_err();

        let replacement = PaymentCard {
            id: CardId::new("card-2").unwrap(),
            ..card()
        };
        f.store
            .remove_payment_card(&user_id(), &card().id)
            .await
            .unwrap();
        f.store
            .add_payment_card(&user_id(), &replacement)
            .await
            .unwrap();

        let retried = f.handler.handle(command(PlanType::Weekly)).await.unwrap();

        assert_eq!(retried.subscription.card_id.as_str(), "card-2");
        assert_eq!(f.processor.subscription_count(), 2);
        assert_eq!(f.store.subscription_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_processor_status_is_internal_error() {
        let f = fixture(user_with_card()).await;
        f.processor
            .set_next_subscription_status(ProcessorSubscriptionStatus::Unknown("LIMBO".into()));

        let err = f.handler.handle(command(PlanType::Weekly)).await.unwrap_err();

        assert!(matches!(
            err.root(),
            BillingError::UnexpectedProcessorResponse(_)
        ));
        assert_eq!(f.store.subscription_count().await, 0);
    }
}
