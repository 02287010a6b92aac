//! Mock payment processor for testing.
//!
//! Provides a configurable mock implementation of `PaymentProcessor` for unit
//! and integration tests. Supports:
//! - An in-memory catalog with paged listing
//! - Idempotent replay of customers, catalog upserts and subscriptions
//! - Error injection
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::{BillingCustomerId, CardId, SubscriptionId, Timestamp};
use crate::domain::user::PaymentCard;
use crate::ports::{
    CatalogObject, CatalogObjectDraft, CatalogObjectKind, CatalogPage, CreateCardRequest,
    CreateCustomerRequest, CreateSubscriptionRequest, PaymentError, PaymentProcessor,
    ProcessorSubscription, ProcessorSubscriptionStatus, UpsertCatalogObjectRequest,
};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Mock payment processor for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProcessor::new();
///
/// // Inject errors
/// mock.set_method_error("create_subscription", PaymentError::single(402, ...));
///
/// // Assert on calls
/// assert_eq!(mock.call_count("upsert_catalog_object"), 2);
/// ```
#[derive(Default)]
pub struct MockPaymentProcessor {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    /// Catalog objects in creation order.
    catalog: Vec<CatalogObject>,

    /// Page size for catalog listings (0 means the default).
    catalog_page_size: usize,

    /// Subscriptions by ID.
    subscriptions: HashMap<String, ProcessorSubscription>,

    /// Results already returned, keyed by idempotency key.
    customers_by_key: HashMap<String, BillingCustomerId>,
    catalog_by_key: HashMap<String, CatalogObject>,
    subscriptions_by_key: HashMap<String, ProcessorSubscription>,
    cards_by_key: HashMap<String, PaymentCard>,

    /// Status reported by the next `create_subscription`.
    next_subscription_status: Option<ProcessorSubscriptionStatus>,

    /// Canceled date reported by `cancel_subscription`.
    canceled_date: Option<Timestamp>,

    /// Counter for generated ids.
    sequence: u32,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{}_mock_{}", prefix, self.sequence)
    }
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProcessor {
    /// Create a new mock processor with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add an object to the catalog.
    pub fn add_catalog_object(&self, object: CatalogObject) {
        self.state().catalog.push(object);
    }

    /// Snapshot of the catalog.
    pub fn catalog(&self) -> Vec<CatalogObject> {
        self.state().catalog.clone()
    }

    /// Limit how many objects a single listing page returns.
    pub fn set_catalog_page_size(&self, size: usize) {
        self.state().catalog_page_size = size;
    }

    /// Status to report for the next created subscription.
    pub fn set_next_subscription_status(&self, status: ProcessorSubscriptionStatus) {
        self.state().next_subscription_status = Some(status);
    }

    /// Canceled date to report from `cancel_subscription`.
    pub fn set_canceled_date(&self, date: Timestamp) {
        self.state().canceled_date = Some(date);
    }

    /// Add a subscription the processor already knows about.
    pub fn add_subscription(&self, subscription: ProcessorSubscription) {
        self.state()
            .subscriptions
            .insert(subscription.id.to_string(), subscription);
    }

    /// Snapshot of a subscription.
    pub fn subscription(&self, id: &SubscriptionId) -> Option<ProcessorSubscription> {
        self.state().subscriptions.get(id.as_str()).cloned()
    }

    /// Number of subscriptions the processor holds.
    pub fn subscription_count(&self) -> usize {
        self.state().subscriptions.len()
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        // Method-specific errors persist until cleared
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl Clone for MockPaymentProcessor {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn not_found(what: &str, id: &str) -> PaymentError {
    PaymentError::single(
        404,
        "INVALID_REQUEST_ERROR",
        "NOT_FOUND",
        Some(format!("{} {} not found", what, id)),
    )
}

fn invalid_id(e: impl std::fmt::Display) -> PaymentError {
    PaymentError::invalid_response(e.to_string())
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<BillingCustomerId, PaymentError> {
        self.record_call(
            "create_customer",
            vec![request.user_id.to_string(), request.email.clone()],
        );
        self.check_error("create_customer")?;

        let mut state = self.state();
        let key = request.idempotency_key.to_string();
        if let Some(existing) = state.customers_by_key.get(&key) {
            return Ok(existing.clone());
        }

        let id = BillingCustomerId::new(state.next_id("cust")).map_err(invalid_id)?;
        state.customers_by_key.insert(key, id.clone());
        Ok(id)
    }

    async fn list_catalog(
        &self,
        kind: CatalogObjectKind,
        cursor: Option<String>,
    ) -> Result<CatalogPage, PaymentError> {
        self.record_call(
            "list_catalog",
            vec![kind.to_string(), cursor.clone().unwrap_or_default()],
        );
        self.check_error("list_catalog")?;

        let state = self.state();
        let start = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| not_found("Cursor", &c))?,
            None => 0,
        };
        let page_size = match state.catalog_page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n,
        };

        let matching: Vec<&CatalogObject> =
            state.catalog.iter().filter(|o| o.kind == kind).collect();
        let end = (start + page_size).min(matching.len());
        let objects = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|o| (*o).clone())
            .collect();

        Ok(CatalogPage {
            objects,
            cursor: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn upsert_catalog_object(
        &self,
        request: UpsertCatalogObjectRequest,
    ) -> Result<CatalogObject, PaymentError> {
        self.record_call(
            "upsert_catalog_object",
            vec![
                request.object.kind().to_string(),
                request.object.name().to_string(),
            ],
        );
        self.check_error("upsert_catalog_object")?;

        let mut state = self.state();
        let key = request.idempotency_key.to_string();
        if let Some(existing) = state.catalog_by_key.get(&key) {
            return Ok(existing.clone());
        }

        let object = match &request.object {
            CatalogObjectDraft::Plan { name, .. } => CatalogObject {
                id: state.next_id("plan"),
                kind: CatalogObjectKind::SubscriptionPlan,
                name: name.clone(),
                plan_id: None,
            },
            CatalogObjectDraft::Variation { plan_id, name, .. } => CatalogObject {
                id: state.next_id("var"),
                kind: CatalogObjectKind::SubscriptionPlanVariation,
                name: name.clone(),
                plan_id: Some(plan_id.to_string()),
            },
        };

        state.catalog.push(object.clone());
        state.catalog_by_key.insert(key, object.clone());
        Ok(object)
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<ProcessorSubscription, PaymentError> {
        self.record_call(
            "create_subscription",
            vec![
                request.customer_id.to_string(),
                request.plan_variation_id.to_string(),
                request.card_id.to_string(),
                request.price_override_cents.to_string(),
            ],
        );
        self.check_error("create_subscription")?;

        let mut state = self.state();
        let key = request.idempotency_key.to_string();
        if let Some(existing) = state.subscriptions_by_key.get(&key) {
            return Ok(existing.clone());
        }

        let now = Timestamp::now();
        let subscription = ProcessorSubscription {
            id: SubscriptionId::new(state.next_id("sub")).map_err(invalid_id)?,
            status: state
                .next_subscription_status
                .take()
                .unwrap_or(ProcessorSubscriptionStatus::Active),
            created_at: Some(now),
            start_date: Some(now),
            canceled_date: None,
        };

        state
            .subscriptions
            .insert(subscription.id.to_string(), subscription.clone());
        state.subscriptions_by_key.insert(key, subscription.clone());
        Ok(subscription)
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<ProcessorSubscription, PaymentError> {
        self.record_call("cancel_subscription", vec![subscription_id.to_string()]);
        self.check_error("cancel_subscription")?;

        let mut state = self.state();
        let canceled_date = state.canceled_date;
        let subscription = state
            .subscriptions
            .get_mut(subscription_id.as_str())
            .ok_or_else(|| not_found("Subscription", subscription_id.as_str()))?;

        subscription.status = ProcessorSubscriptionStatus::Canceled;
        subscription.canceled_date = canceled_date;
        Ok(subscription.clone())
    }

    async fn create_card(&self, request: CreateCardRequest) -> Result<PaymentCard, PaymentError> {
        self.record_call(
            "create_card",
            vec![request.customer_id.to_string(), request.source_id.clone()],
        );
        self.check_error("create_card")?;

        let mut state = self.state();
        let key = request.idempotency_key.to_string();
        if let Some(existing) = state.cards_by_key.get(&key) {
            return Ok(existing.clone());
        }

        let card = PaymentCard {
            id: CardId::new(state.next_id("ccof")).map_err(invalid_id)?,
            brand: Some("VISA".to_string()),
            last_4: Some("1111".to_string()),
            exp_month: Some(12),
            exp_year: Some(2030),
            cardholder_name: request.cardholder_name,
        };
        state.cards_by_key.insert(key, card.clone());
        Ok(card)
    }

    async fn disable_card(&self, card_id: &CardId) -> Result<(), PaymentError> {
        self.record_call("disable_card", vec![card_id.to_string()]);
        self.check_error("disable_card")
    }
}
