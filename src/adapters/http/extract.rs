//! JSON body extraction with billing error responses.
//!
//! Wraps `axum::Json` so that a missing, malformed or mistyped body is
//! rejected as a 400 validation error in the standard error body instead of
//! axum's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::domain::billing::BillingError;

use super::error::BillingApiError;

/// JSON request body.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for BillingApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(BillingError::validation("body", rejection.body_text()))
    }
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BillingApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct PlanBody {
        plan_type: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let request = request(Some("application/json"), r#"{"planType":"WEEKLY"}"#);

        let JsonBody(body) = JsonBody::<PlanBody>::from_request(request, &())
            .await
            .unwrap();

        assert_eq!(body.plan_type, "WEEKLY");
    }

    #[tokio::test]
    async fn missing_field_is_a_validation_error() {
        let err = JsonBody::<PlanBody>::from_request(request(Some("application/json"), "{}"), &())
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.0.error_code(), "VALIDATION_FAILED");
        assert!(err.0.message().contains("planType"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let err = JsonBody::<PlanBody>::from_request(request(Some("application/json"), "{"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_content_type_is_a_validation_error() {
        let request = request(None, r#"{"planType":"WEEKLY"}"#);

        let err = JsonBody::<PlanBody>::from_request(request, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
