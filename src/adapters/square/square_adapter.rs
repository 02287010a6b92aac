//! Square payments processor adapter.
//!
//! Implements the `PaymentProcessor` port against the Square v2 REST API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = SquareConfig::new(access_token, location_id);
//! let processor = SquarePaymentProcessor::new(config);
//! ```

use async_trait::async_trait;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::config::{PaymentConfig, SquareEnvironment};
use crate::domain::foundation::{
    BillingCustomerId, CardId, SubscriptionId, Timestamp,
};
use crate::domain::user::PaymentCard;
use crate::ports::{
    CatalogObject, CatalogObjectDraft, CatalogObjectKind, CatalogPage, CreateCardRequest,
    CreateCustomerRequest, CreateSubscriptionRequest, PaymentError, PaymentProcessor,
    PricingPhase, ProcessorSubscription, ProcessorSubscriptionStatus, UpsertCatalogObjectRequest,
};

use super::wire_types::{
    CardResponse, CreateCardBody, CreateCustomerBody, CreateSubscriptionBody, CustomerResponse,
    ErrorEnvelope, ListCatalogResponse, Money, NewCard, SquareCard, SquareCatalogObject,
    SquareSubscription, SubscriptionPhase, SubscriptionPlanData, SubscriptionPlanVariationData,
    SubscriptionPricing, SubscriptionResponse, UpsertCatalogObjectBody,
    UpsertCatalogObjectResponse,
};

/// Square API configuration.
#[derive(Clone)]
pub struct SquareConfig {
    /// Square access token.
    access_token: SecretString,

    /// Location subscriptions are created at.
    location_id: String,

    /// Base URL for the Square API.
    api_base_url: String,

    /// Value of the `Square-Version` header.
    api_version: String,

    /// ISO 4217 currency for all prices.
    currency: String,
}

impl SquareConfig {
    /// Create a sandbox configuration with default version and currency.
    pub fn new(access_token: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            location_id: location_id.into(),
            api_base_url: SquareEnvironment::Sandbox.base_url().to_string(),
            api_version: crate::config::DEFAULT_SQUARE_API_VERSION.to_string(),
            currency: "USD".to_string(),
        }
    }

    /// Build from loaded application configuration.
    pub fn from_payment_config(config: &PaymentConfig) -> Self {
        Self {
            access_token: SecretString::new(config.square_access_token.clone()),
            location_id: config.square_location_id.clone(),
            api_base_url: config.base_url(),
            api_version: config.square_api_version.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

/// Square payments processor.
pub struct SquarePaymentProcessor {
    config: SquareConfig,
    http_client: reqwest::Client,
}

impl SquarePaymentProcessor {
    pub fn new(config: SquareConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    fn money(&self, amount: u64) -> Money {
        Money {
            amount,
            currency: self.config.currency.clone(),
        }
    }

    /// Send an authenticated request and decode the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, PaymentError> {
        let response = request
            .bearer_auth(self.config.access_token.expose_secret())
            .header("Square-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(operation, error = %e, "Square request failed to send");
                PaymentError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let errors = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) if !envelope.errors.is_empty() => envelope.errors,
                _ => PaymentError::single(
                    status.as_u16(),
                    "API_ERROR",
                    "UNPARSEABLE_ERROR",
                    Some(body.clone()),
                )
                .errors,
            };
            let error = PaymentError::new(status.as_u16(), errors);
            tracing::warn!(
                operation,
                status = status.as_u16(),
                error = %error,
                "Square API returned an error"
            );
            return Err(error);
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to parse Square response");
            PaymentError::invalid_response(format!("Failed to parse Square response: {}", e))
        })
    }

    fn phase(&self, phase: &PricingPhase, ordinal: u32) -> SubscriptionPhase {
        SubscriptionPhase {
            cadence: phase.plan_type.cadence().to_string(),
            periods: phase.periods,
            ordinal,
            pricing: Some(SubscriptionPricing {
                pricing_type: "STATIC".to_string(),
                price_money: Some(self.money(phase.price_cents)),
            }),
        }
    }

    fn to_wire_object(&self, draft: &CatalogObjectDraft) -> SquareCatalogObject {
        match draft {
            CatalogObjectDraft::Plan { name, phases } => SquareCatalogObject {
                object_type: CatalogObjectKind::SubscriptionPlan.as_str().to_string(),
                id: format!("#{}", name),
                subscription_plan_data: Some(SubscriptionPlanData {
                    name: name.clone(),
                    phases: phases
                        .iter()
                        .enumerate()
                        .map(|(i, p)| self.phase(p, i as u32))
                        .collect(),
                }),
                subscription_plan_variation_data: None,
            },
            CatalogObjectDraft::Variation {
                plan_id,
                name,
                phase,
            } => SquareCatalogObject {
                object_type: CatalogObjectKind::SubscriptionPlanVariation
                    .as_str()
                    .to_string(),
                id: format!("#{}", name),
                subscription_plan_data: None,
                subscription_plan_variation_data: Some(SubscriptionPlanVariationData {
                    name: name.clone(),
                    phases: vec![self.phase(phase, 0)],
                    subscription_plan_id: Some(plan_id.to_string()),
                }),
            },
        }
    }
}

fn from_wire_object(object: SquareCatalogObject) -> Option<CatalogObject> {
    match object.object_type.as_str() {
        "SUBSCRIPTION_PLAN" => Some(CatalogObject {
            id: object.id,
            kind: CatalogObjectKind::SubscriptionPlan,
            name: object.subscription_plan_data.map(|d| d.name).unwrap_or_default(),
            plan_id: None,
        }),
        "SUBSCRIPTION_PLAN_VARIATION" => {
            let data = object.subscription_plan_variation_data;
            Some(CatalogObject {
                id: object.id,
                kind: CatalogObjectKind::SubscriptionPlanVariation,
                name: data.as_ref().map(|d| d.name.clone()).unwrap_or_default(),
                plan_id: data.and_then(|d| d.subscription_plan_id),
            })
        }
        _ => None,
    }
}

fn from_wire_subscription(sub: SquareSubscription) -> Result<ProcessorSubscription, PaymentError> {
    let id = SubscriptionId::new(sub.id)
        .map_err(|_| PaymentError::invalid_response("Subscription without id"))?;
    Ok(ProcessorSubscription {
        id,
        status: ProcessorSubscriptionStatus::parse(sub.status.as_deref().unwrap_or("")),
        created_at: sub.created_at.as_deref().and_then(Timestamp::parse_rfc3339),
        start_date: sub.start_date.as_deref().and_then(Timestamp::parse_date),
        canceled_date: sub.canceled_date.as_deref().and_then(Timestamp::parse_date),
    })
}

fn from_wire_card(card: SquareCard) -> Result<PaymentCard, PaymentError> {
    let id = CardId::new(card.id).map_err(|_| PaymentError::invalid_response("Card without id"))?;
    Ok(PaymentCard {
        id,
        brand: card.card_brand,
        last_4: card.last_4,
        exp_month: card.exp_month,
        exp_year: card.exp_year,
        cardholder_name: card.cardholder_name,
    })
}

#[async_trait]
impl PaymentProcessor for SquarePaymentProcessor {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<BillingCustomerId, PaymentError> {
        let body = CreateCustomerBody {
            idempotency_key: request.idempotency_key.as_str(),
            email_address: &request.email,
            reference_id: request.user_id.as_str(),
            given_name: request.given_name.as_deref(),
            family_name: request.family_name.as_deref(),
        };

        let response: CustomerResponse = self
            .send(
                self.http_client.post(self.url("customers")).json(&body),
                "create_customer",
            )
            .await?;

        response
            .customer
            .and_then(|c| BillingCustomerId::new(c.id).ok())
            .ok_or_else(|| PaymentError::invalid_response("Customer missing from response"))
    }

    async fn list_catalog(
        &self,
        kind: CatalogObjectKind,
        cursor: Option<String>,
    ) -> Result<CatalogPage, PaymentError> {
        let mut query = vec![("types", kind.as_str().to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let response: ListCatalogResponse = self
            .send(
                self.http_client.get(self.url("catalog/list")).query(&query),
                "list_catalog",
            )
            .await?;

        Ok(CatalogPage {
            objects: response
                .objects
                .into_iter()
                .filter_map(from_wire_object)
                .filter(|o| o.kind == kind)
                .collect(),
            cursor: response.cursor.filter(|c| !c.is_empty()),
        })
    }

    async fn upsert_catalog_object(
        &self,
        request: UpsertCatalogObjectRequest,
    ) -> Result<CatalogObject, PaymentError> {
        let body = UpsertCatalogObjectBody {
            idempotency_key: request.idempotency_key.as_str(),
            object: self.to_wire_object(&request.object),
        };

        let response: UpsertCatalogObjectResponse = self
            .send(
                self.http_client.post(self.url("catalog/object")).json(&body),
                "upsert_catalog_object",
            )
            .await?;

        response
            .catalog_object
            .and_then(from_wire_object)
            .ok_or_else(|| PaymentError::invalid_response("Catalog object missing from response"))
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<ProcessorSubscription, PaymentError> {
        let body = CreateSubscriptionBody {
            idempotency_key: request.idempotency_key.as_str(),
            location_id: &self.config.location_id,
            plan_variation_id: request.plan_variation_id.as_str(),
            customer_id: request.customer_id.as_str(),
            card_id: request.card_id.as_str(),
            price_override_money: self.money(request.price_override_cents),
        };

        let response: SubscriptionResponse = self
            .send(
                self.http_client.post(self.url("subscriptions")).json(&body),
                "create_subscription",
            )
            .await?;

        let subscription = response
            .subscription
            .ok_or_else(|| PaymentError::invalid_response("Subscription missing from response"))?;
        from_wire_subscription(subscription)
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<ProcessorSubscription, PaymentError> {
        let path = format!("subscriptions/{}/cancel", subscription_id);
        let response: SubscriptionResponse = self
            .send(self.http_client.post(self.url(&path)), "cancel_subscription")
            .await?;

        let subscription = response
            .subscription
            .ok_or_else(|| PaymentError::invalid_response("Subscription missing from response"))?;
        from_wire_subscription(subscription)
    }

    async fn create_card(&self, request: CreateCardRequest) -> Result<PaymentCard, PaymentError> {
        let body = CreateCardBody {
            idempotency_key: request.idempotency_key.as_str(),
            source_id: &request.source_id,
            card: NewCard {
                customer_id: request.customer_id.as_str(),
                cardholder_name: request.cardholder_name.as_deref(),
            },
        };

        let response: CardResponse = self
            .send(
                self.http_client.post(self.url("cards")).json(&body),
                "create_card",
            )
            .await?;

        let card = response
            .card
            .ok_or_else(|| PaymentError::invalid_response("Card missing from response"))?;
        from_wire_card(card)
    }

    async fn disable_card(&self, card_id: &CardId) -> Result<(), PaymentError> {
        let path = format!("cards/{}/disable", card_id);
        let _: CardResponse = self
            .send(self.http_client.post(self.url(&path)), "disable_card")
            .await?;
        Ok(())
    }
}
