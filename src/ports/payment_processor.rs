//! Payment processor port.
//!
//! Contract for the external payments API (customers, catalog, subscriptions
//! and cards). Every mutating call carries an idempotency key; every failure
//! carries the processor's HTTP status and structured error list so callers
//! can surface them unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::billing::{IdempotencyKey, PlanType, SubscriptionStatus};
use crate::domain::foundation::{
    BillingCustomerId, CardId, PlanId, PlanVariationId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::user::PaymentCard;

/// Port for the payments processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a billing customer.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<BillingCustomerId, PaymentError>;

    /// List one page of catalog objects of a kind.
    ///
    /// Pass the returned cursor back to fetch the next page.
    async fn list_catalog(
        &self,
        kind: CatalogObjectKind,
        cursor: Option<String>,
    ) -> Result<CatalogPage, PaymentError>;

    /// Create or update a catalog object, returning it with its assigned id.
    async fn upsert_catalog_object(
        &self,
        request: UpsertCatalogObjectRequest,
    ) -> Result<CatalogObject, PaymentError>;

    /// Start a recurring subscription.
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<ProcessorSubscription, PaymentError>;

    /// Cancel a subscription.
    async fn cancel_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<ProcessorSubscription, PaymentError>;

    /// Store a card for a customer from a client-side card nonce.
    async fn create_card(&self, request: CreateCardRequest) -> Result<PaymentCard, PaymentError>;

    /// Disable a stored card so it can no longer be charged.
    async fn disable_card(&self, card_id: &CardId) -> Result<(), PaymentError>;
}

/// Request to create a billing customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerRequest {
    pub idempotency_key: IdempotencyKey,
    /// Stored as the customer's reference id.
    pub user_id: UserId,
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Catalog object types used by billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogObjectKind {
    SubscriptionPlan,
    SubscriptionPlanVariation,
}

impl CatalogObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogObjectKind::SubscriptionPlan => "SUBSCRIPTION_PLAN",
            CatalogObjectKind::SubscriptionPlanVariation => "SUBSCRIPTION_PLAN_VARIATION",
        }
    }
}

impl fmt::Display for CatalogObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog object as listed or returned by an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogObject {
    pub id: String,
    pub kind: CatalogObjectKind,
    pub name: String,
    /// Parent plan of a variation.
    pub plan_id: Option<String>,
}

/// One page of a catalog listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub objects: Vec<CatalogObject>,
    pub cursor: Option<String>,
}

/// A fixed-price billing phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPhase {
    pub plan_type: PlanType,
    pub periods: Option<u32>,
    pub price_cents: u64,
}

/// Catalog object to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogObjectDraft {
    Plan {
        name: String,
        phases: Vec<PricingPhase>,
    },
    Variation {
        plan_id: PlanId,
        name: String,
        phase: PricingPhase,
    },
}

impl CatalogObjectDraft {
    pub fn kind(&self) -> CatalogObjectKind {
        match self {
            CatalogObjectDraft::Plan { .. } => CatalogObjectKind::SubscriptionPlan,
            CatalogObjectDraft::Variation { .. } => CatalogObjectKind::SubscriptionPlanVariation,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CatalogObjectDraft::Plan { name, .. } | CatalogObjectDraft::Variation { name, .. } => {
                name
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpsertCatalogObjectRequest {
    pub idempotency_key: IdempotencyKey,
    pub object: CatalogObjectDraft,
}

/// Request to start a subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionRequest {
    pub idempotency_key: IdempotencyKey,
    pub customer_id: BillingCustomerId,
    pub plan_variation_id: PlanVariationId,
    pub card_id: CardId,
    /// Discounted price that replaces the variation's price.
    pub price_override_cents: u64,
}

/// Subscription status as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorSubscriptionStatus {
    Pending,
    Active,
    Paused,
    Canceled,
    Deactivated,
    Unknown(String),
}

impl ProcessorSubscriptionStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "PENDING" => ProcessorSubscriptionStatus::Pending,
            "ACTIVE" => ProcessorSubscriptionStatus::Active,
            "PAUSED" => ProcessorSubscriptionStatus::Paused,
            "CANCELED" => ProcessorSubscriptionStatus::Canceled,
            "DEACTIVATED" => ProcessorSubscriptionStatus::Deactivated,
            other => ProcessorSubscriptionStatus::Unknown(other.to_string()),
        }
    }

    /// Local status for a processor status; `None` when it has no local meaning.
    pub fn to_local(&self) -> Option<SubscriptionStatus> {
        match self {
            ProcessorSubscriptionStatus::Pending
            | ProcessorSubscriptionStatus::Active
            | ProcessorSubscriptionStatus::Paused => Some(SubscriptionStatus::Active),
            ProcessorSubscriptionStatus::Canceled | ProcessorSubscriptionStatus::Deactivated => {
                Some(SubscriptionStatus::Cancelled)
            }
            ProcessorSubscriptionStatus::Unknown(_) => None,
        }
    }
}

/// Subscription as returned by the processor.
#[derive(Debug, Clone)]
pub struct ProcessorSubscription {
    pub id: SubscriptionId,
    pub status: ProcessorSubscriptionStatus,
    pub created_at: Option<Timestamp>,
    pub start_date: Option<Timestamp>,
    pub canceled_date: Option<Timestamp>,
}

/// Request to store a card on file.
#[derive(Debug, Clone)]
pub struct CreateCardRequest {
    pub idempotency_key: IdempotencyKey,
    pub customer_id: BillingCustomerId,
    /// Card nonce produced by the client-side payment form.
    pub source_id: String,
    pub cardholder_name: Option<String>,
}

/// One entry of the processor's structured error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorErrorDetail {
    pub category: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Error returned by the payments processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentError {
    /// HTTP status reported by the processor (or synthesised for transport failures).
    pub status: u16,
    pub errors: Vec<ProcessorErrorDetail>,
}

impl PaymentError {
    pub fn new(status: u16, errors: Vec<ProcessorErrorDetail>) -> Self {
        Self { status, errors }
    }

    /// Error with a single entry.
    pub fn single(
        status: u16,
        category: impl Into<String>,
        code: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::new(
            status,
            vec![ProcessorErrorDetail {
                category: category.into(),
                code: code.into(),
                detail,
                field: None,
            }],
        )
    }

    /// The processor could not be reached.
    pub fn network(message: impl Into<String>) -> Self {
        Self::single(502, "API_ERROR", "NETWORK_ERROR", Some(message.into()))
    }

    /// The processor answered with something unparseable.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::single(502, "API_ERROR", "INVALID_RESPONSE", Some(message.into()))
    }

    /// First error's detail, falling back to its code.
    pub fn message(&self) -> String {
        self.errors
            .first()
            .map(|e| e.detail.clone().unwrap_or_else(|| e.code.clone()))
            .unwrap_or_else(|| "Payment processor error".to_string())
    }

    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.errors.iter().map(|e| e.code.as_str()).collect();
        write!(
            f,
            "Payment processor error {} [{}]: {}",
            self.status,
            codes.join(", "),
            self.message()
        )
    }
}

impl std::error::Error for PaymentError {}
