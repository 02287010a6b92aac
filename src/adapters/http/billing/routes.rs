//! Axum router configuration for billing endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    add_card, add_discount, apply_discount, cancel_subscription, create_subscription,
    get_applied_discount, get_discounted_price, list_cards, list_discounts, remove_card, BillingAppState,
};

/// Subscription routes.
///
/// - `POST /subscription` - Subscribe to a plan
/// - `POST /cancel-subscription` - Cancel the active subscription
pub fn subscription_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/subscription", post(create_subscription))
        .route("/cancel-subscription", post(cancel_subscription))
}

/// User routes.
///
/// - `GET /discounted-price?planType=` - Price preview
pub fn user_routes() -> Router<BillingAppState> {
    Router::new().route("/discounted-price", get(get_discounted_price))
}

/// Discount routes.
pub fn discount_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/add-discount", post(add_discount))
        .route("/apply-discount", post(apply_discount))
        .route("/discounted-price", get(get_applied_discount))
        .route("/discounts", get(list_discounts))
}

/// Card-on-file routes.
pub fn payment_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/create-customer-card", post(add_card))
        .route("/get-user-card", get(list_cards))
        .route("/delete-customer-card", delete(remove_card))
}

/// Create the complete billing router.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/subscriptions", subscription_routes())
        .nest("/users", user_routes())
        .nest("/discount", discount_routes())
        .nest("/payments", payment_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::square::MockPaymentProcessor;
    use crate::adapters::storage::InMemoryBillingStore;
    use crate::domain::foundation::UserId;
    use crate::domain::user::UserAccount;

    async fn app() -> Router {
        let store = InMemoryBillingStore::new();
        store
            .insert_user(UserAccount::new(
                UserId::new("user-1").unwrap(),
                "reader@example.com",
            ))
            .await;
        let state = BillingAppState::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            Arc::new(MockPaymentProcessor::new()),
        );
        billing_router().with_state(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn discounted_price_without_discount() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/users/discounted-price?planType=WEEKLY")
                    .header("X-User-Id", "user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["discountedPrice"], 100);
    }

    #[tokio::test]
    async fn invalid_plan_type_is_400() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/users/discounted-price?planType=MONTHLY")
                    .header("X-User-Id", "user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error_code"], "UNKNOWN_PLAN_TYPE");
    }

    #[tokio::test]
    async fn missing_user_header_is_401() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/subscriptions/cancel-subscription")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cancel_without_subscription_is_400() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/subscriptions/cancel-subscription")
                    .header("X-User-Id", "user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error_code"],
            "SUBSCRIPTION_NOT_ACTIVE"
        );
    }

    #[tokio::test]
    async fn subscribe_with_empty_body_is_400_json() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/subscriptions/subscription")
                    .header("X-User-Id", "user-1")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "VALIDATION_FAILED");
        assert!(body["message"].as_str().unwrap().contains("planType"));
    }

    #[tokio::test]
    async fn applied_discount_without_code_is_400() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/discount/discounted-price")
                    .header("X-User-Id", "user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error_code"], "NO_DISCOUNT_APPLIED");
    }

    #[tokio::test]
    async fn empty_discount_list_is_404() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/discount/discounts")
                    .header("X-User-Id", "user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
