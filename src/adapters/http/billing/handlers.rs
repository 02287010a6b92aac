//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::{
    AddCardCommand, AddCardHandler, AddDiscountCommand, AddDiscountHandler, ApplyDiscountCommand,
    ApplyDiscountHandler, CancelSubscriptionCommand, CancelSubscriptionHandler,
    CreateSubscriptionCommand, CreateSubscriptionHandler, CustomerProvisioner,
    GetAppliedDiscountHandler, GetDiscountedPriceHandler, GetDiscountedPriceQuery, ListCardsHandler, ListDiscountsHandler,
    RemoveCardCommand, RemoveCardHandler,
};
use crate::application::UserLocks;
use crate::domain::billing::{BillingError, PlanType};
use crate::domain::foundation::CardId;
use crate::ports::{DiscountRepository, PaymentProcessor, SubscriptionStore, UserRepository};

use super::super::auth::AuthenticatedUser;
use super::super::error::BillingApiError;
use super::super::extract::JsonBody;
use super::dto::{
    AddCardRequest, AddDiscountRequest, AppliedDiscountResponse, ApplyDiscountRequest,
    CardListResponse, CardResponse, CreateSubscriptionRequest, DiscountListResponse,
    DiscountResponse, DiscountedPriceParams, DiscountedPriceResponse, RemoveCardRequest,
    SubscriptionResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; every field is Arc-wrapped. The user locks are shared
/// so that every handler serialises on the same per-user mutex.
#[derive(Clone)]
pub struct BillingAppState {
    pub users: Arc<dyn UserRepository>,
    pub discounts: Arc<dyn DiscountRepository>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub processor: Arc<dyn PaymentProcessor>,
    pub locks: Arc<UserLocks>,
}

impl BillingAppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        discounts: Arc<dyn DiscountRepository>,
        subscriptions: Arc<dyn SubscriptionStore>,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            users,
            discounts,
            subscriptions,
            processor,
            locks: Arc::new(UserLocks::new()),
        }
    }

    /// Create handlers on demand from the shared state.
    pub fn create_subscription_handler(&self) -> CreateSubscriptionHandler {
        CreateSubscriptionHandler::new(
            self.users.clone(),
            self.discounts.clone(),
            self.subscriptions.clone(),
            self.processor.clone(),
            self.locks.clone(),
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(
            self.users.clone(),
            self.subscriptions.clone(),
            self.processor.clone(),
            self.locks.clone(),
        )
    }

    pub fn discounted_price_handler(&self) -> GetDiscountedPriceHandler {
        GetDiscountedPriceHandler::new(self.users.clone(), self.discounts.clone())
    }

    pub fn add_discount_handler(&self) -> AddDiscountHandler {
        AddDiscountHandler::new(self.discounts.clone())
    }

    pub fn apply_discount_handler(&self) -> ApplyDiscountHandler {
        ApplyDiscountHandler::new(self.users.clone(), self.discounts.clone())
    }

    pub fn applied_discount_handler(&self) -> GetAppliedDiscountHandler {
        GetAppliedDiscountHandler::new(self.users.clone(), self.discounts.clone())
    }

    pub fn list_discounts_handler(&self) -> ListDiscountsHandler {
        ListDiscountsHandler::new(self.discounts.clone())
    }

    pub fn add_card_handler(&self) -> AddCardHandler {
        AddCardHandler::new(
            self.users.clone(),
            self.processor.clone(),
            Arc::new(CustomerProvisioner::new(
                self.users.clone(),
                self.processor.clone(),
                self.locks.clone(),
            )),
        )
    }

    pub fn list_cards_handler(&self) -> ListCardsHandler {
        ListCardsHandler::new(self.users.clone())
    }

    pub fn remove_card_handler(&self) -> RemoveCardHandler {
        RemoveCardHandler::new(self.users.clone(), self.processor.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// POST /subscriptions/subscription - Subscribe the caller to a plan
pub async fn create_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let plan_type: PlanType = request.plan_type.parse()?;

    let result = state
        .create_subscription_handler()
        .handle(CreateSubscriptionCommand {
            user_id: user.user_id,
            plan_type,
        })
        .await?;

    Ok(Json(SubscriptionResponse::from(result.subscription)))
}

/// POST /subscriptions/cancel-subscription - Cancel the caller's subscription
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .cancel_subscription_handler()
        .handle(CancelSubscriptionCommand {
            user_id: user.user_id,
        })
        .await?;

    Ok(Json(SubscriptionResponse::from(result.subscription)))
}

/// GET /users/discounted-price?planType= - Preview the caller's price
pub async fn get_discounted_price(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Query(params): Query<DiscountedPriceParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let plan_type: PlanType = params
        .plan_type
        .ok_or_else(|| BillingError::validation("planType", "planType is required"))?
        .parse()?;

    let price = state
        .discounted_price_handler()
        .handle(GetDiscountedPriceQuery {
            user_id: user.user_id,
            plan_type,
        })
        .await?;

    Ok(Json(DiscountedPriceResponse {
        discounted_price: price.price_cents,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Discounts
// ════════════════════════════════════════════════════════════════════════════════

/// POST /discount/add-discount - Create a discount code
pub async fn add_discount(
    State(state): State<BillingAppState>,
    _user: AuthenticatedUser,
    JsonBody(request): JsonBody<AddDiscountRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let discount = state
        .add_discount_handler()
        .handle(AddDiscountCommand {
            code: request.discount_code,
            percentage: request.percentage.into_text(),
        })
        .await?;

    Ok(Json(DiscountResponse::from(discount)))
}

/// POST /discount/apply-discount - Apply a discount code to the caller
pub async fn apply_discount(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<ApplyDiscountRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let discount = state
        .apply_discount_handler()
        .handle(ApplyDiscountCommand {
            user_id: user.user_id,
            code: request.discount_code,
        })
        .await?;

    Ok(Json(AppliedDiscountResponse {
        percentage: discount.percentage.to_string(),
    }))
}

/// GET /discount/discounted-price - The caller's applied discount percentage
pub async fn get_applied_discount(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let percentage = state
        .applied_discount_handler()
        .handle(&user.user_id)
        .await?;

    Ok(Json(AppliedDiscountResponse {
        percentage: percentage.to_string(),
    }))
}

/// GET /discount/discounts - List all discounts
pub async fn list_discounts(
    State(state): State<BillingAppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let discounts = state.list_discounts_handler().handle().await?;

    Ok(Json(DiscountListResponse {
        discounts: discounts.into_iter().map(DiscountResponse::from).collect(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Cards
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payments/create-customer-card - Store a card for the caller
pub async fn add_card(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<AddCardRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let card = state
        .add_card_handler()
        .handle(AddCardCommand {
            user_id: user.user_id,
            nonce: request.nonce,
            cardholder_name: request.cardholder_name,
        })
        .await?;

    Ok(Json(CardResponse::from(card)))
}

/// GET /payments/get-user-card - List the caller's cards
pub async fn list_cards(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let cards = state.list_cards_handler().handle(&user.user_id).await?;

    Ok(Json(CardListResponse {
        cards: cards.into_iter().map(CardResponse::from).collect(),
    }))
}

/// DELETE /payments/delete-customer-card - Remove one of the caller's cards
pub async fn remove_card(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<RemoveCardRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let card_id = CardId::new(request.card_id)?;

    state
        .remove_card_handler()
        .handle(RemoveCardCommand {
            user_id: user.user_id,
            card_id,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
