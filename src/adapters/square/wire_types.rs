//! Square v2 API request and response bodies.
//!
//! Only the fields billing reads or writes are modelled; unknown fields are
//! ignored on deserialization.

use serde::{Deserialize, Serialize};

use crate::ports::ProcessorErrorDetail;

// ════════════════════════════════════════════════════════════════════════════════
// Shared
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Money {
    pub amount: u64,
    pub currency: String,
}

/// Error envelope returned with every non-2xx response.
#[derive(Debug, Deserialize, Default)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<ProcessorErrorDetail>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Customers
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct CreateCustomerBody<'a> {
    pub idempotency_key: &'a str,
    pub email_address: &'a str,
    pub reference_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerResponse {
    pub customer: Option<SquareCustomer>,
}

#[derive(Debug, Deserialize)]
pub struct SquareCustomer {
    pub id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Catalog
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct ListCatalogResponse {
    #[serde(default)]
    pub objects: Vec<SquareCatalogObject>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpsertCatalogObjectBody<'a> {
    pub idempotency_key: &'a str,
    pub object: SquareCatalogObject,
}

#[derive(Debug, Deserialize)]
pub struct UpsertCatalogObjectResponse {
    pub catalog_object: Option<SquareCatalogObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquareCatalogObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_plan_data: Option<SubscriptionPlanData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_plan_variation_data: Option<SubscriptionPlanVariationData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlanData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<SubscriptionPhase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlanVariationData {
    pub name: String,
    #[serde(default)]
    pub phases: Vec<SubscriptionPhase>,
    pub subscription_plan_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPhase {
    pub cadence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods: Option<u32>,
    pub ordinal: u32,
    pub pricing: Option<SubscriptionPricing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPricing {
    #[serde(rename = "type")]
    pub pricing_type: String,
    pub price_money: Option<Money>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct CreateSubscriptionBody<'a> {
    pub idempotency_key: &'a str,
    pub location_id: &'a str,
    pub plan_variation_id: &'a str,
    pub customer_id: &'a str,
    pub card_id: &'a str,
    pub price_override_money: Money,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionResponse {
    pub subscription: Option<SquareSubscription>,
}

#[derive(Debug, Deserialize)]
pub struct SquareSubscription {
    pub id: String,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub start_date: Option<String>,
    pub canceled_date: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Cards
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct CreateCardBody<'a> {
    pub idempotency_key: &'a str,
    pub source_id: &'a str,
    pub card: NewCard<'a>,
}

#[derive(Debug, Serialize)]
pub struct NewCard<'a> {
    pub customer_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardholder_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct CardResponse {
    pub card: Option<SquareCard>,
}

#[derive(Debug, Deserialize)]
pub struct SquareCard {
    pub id: String,
    pub card_brand: Option<String>,
    pub last_4: Option<String>,
    pub exp_month: Option<u32>,
    pub exp_year: Option<u32>,
    pub cardholder_name: Option<String>,
}
