//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::domain::billing::{Discount, PlanType, SubscriptionRecord, SubscriptionStatus};
use crate::domain::user::PaymentCard;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a subscription.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    /// `WEEKLY` or `ANNUAL`.
    pub plan_type: String,
}

/// Query string of the price preview.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedPriceParams {
    #[serde(default)]
    pub plan_type: Option<String>,
}

/// A percentage sent either as a JSON string or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PercentageInput {
    Text(String),
    Number(serde_json::Number),
}

impl PercentageInput {
    pub fn into_text(self) -> String {
        match self {
            PercentageInput::Text(text) => text,
            PercentageInput::Number(number) => number.to_string(),
        }
    }
}

/// Request to create a discount.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDiscountRequest {
    pub percentage: PercentageInput,
    pub discount_code: String,
}

/// Request to apply a discount code to the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyDiscountRequest {
    pub discount_code: String,
}

/// Request to store a card from a card nonce.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCardRequest {
    pub nonce: String,
    #[serde(default)]
    pub cardholder_name: Option<String>,
}

/// Request to delete a stored card.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCardRequest {
    pub card_id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Subscription state returned after create or cancel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub subscription_id: String,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub price_cents: u64,
    /// ISO 8601.
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled_date: Option<String>,
}

impl From<SubscriptionRecord> for SubscriptionResponse {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            subscription_id: record.id.to_string(),
            plan_type: record.plan_type,
            status: record.status,
            price_cents: record.price_cents,
            start_date: record.start_date.as_datetime().to_rfc3339(),
            canceled_date: record
                .canceled_date
                .map(|d| d.as_datetime().to_rfc3339()),
        }
    }
}

/// Price preview, in cents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedPriceResponse {
    pub discounted_price: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountResponse {
    pub id: String,
    pub discount_code: String,
    /// Decimal string such as `"12.5"`.
    pub percentage: String,
    pub created_at: String,
}

impl From<Discount> for DiscountResponse {
    fn from(discount: Discount) -> Self {
        Self {
            id: discount.id.to_string(),
            discount_code: discount.code.to_string(),
            percentage: discount.percentage.to_string(),
            created_at: discount.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscountListResponse {
    pub discounts: Vec<DiscountResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedDiscountResponse {
    pub percentage: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub id: String,
    pub card_brand: Option<String>,
    pub last_4: Option<String>,
    pub exp_month: Option<u32>,
    pub exp_year: Option<u32>,
    pub cardholder_name: Option<String>,
}

impl From<PaymentCard> for CardResponse {
    fn from(card: PaymentCard) -> Self {
        Self {
            id: card.id.to_string(),
            card_brand: card.brand,
            last_4: card.last_4,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
            cardholder_name: card.cardholder_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CardListResponse {
    pub cards: Vec<CardResponse>,
}
