//! JSON error responses for the billing API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::billing::{BillingError, ErrorKind, UnknownPlanType};
use crate::domain::foundation::{DomainError, ValidationError};

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(pub BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for BillingApiError {
    fn from(err: DomainError) -> Self {
        Self(err.into())
    }
}

impl From<ValidationError> for BillingApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<UnknownPlanType> for BillingApiError {
    fn from(err: UnknownPlanType) -> Self {
        Self(err.into())
    }
}

impl BillingApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ExternalProcessor => match self.0.root() {
                BillingError::PaymentProcessor(err) => {
                    StatusCode::from_u16(err.status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            ErrorKind::Integrity | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self.0.root() {
            BillingError::PaymentProcessor(err) => serde_json::to_value(&err.errors).ok(),
            BillingError::ValidationFailed { field, .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                error_code = self.0.error_code(),
                detail = %self.0.log_detail(),
                "Request failed"
            );
        } else {
            tracing::debug!(
                status = status.as_u16(),
                error_code = self.0.error_code(),
                "Request rejected"
            );
        }

        let body = match self.details() {
            Some(details) => ErrorResponse::with_details(self.0.error_code(), self.0.message(), details),
            None => ErrorResponse::new(self.0.error_code(), self.0.message()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{SubscriptionStage, WorkflowStep};
    use crate::domain::foundation::{DiscountId, UserId};
    use crate::ports::PaymentError;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn conflict_maps_to_bad_request() {
        let err = BillingApiError(BillingError::already_subscribed(user()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = BillingApiError(BillingError::user_not_found(user()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn processor_status_passes_through_workflow_wrapper() {
        let err = BillingApiError(
            BillingError::from(PaymentError::single(402, "PAYMENT_METHOD_ERROR", "CARD_DECLINED", None))
                .at_stage(SubscriptionStage::Failed {
                    at: WorkflowStep::VariationReady,
                }),
        );
        assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);
        let details = err.details().unwrap();
        assert_eq!(details[0]["code"], "CARD_DECLINED");
    }

    #[test]
    fn integrity_fault_is_500_with_generic_message() {
        let err = BillingApiError(BillingError::discount_not_found(DiscountId::new()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.0.message(), "Billing data is inconsistent");
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("NO_DISCOUNTS", "none")).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["error_code"], "NO_DISCOUNTS");
    }
}
