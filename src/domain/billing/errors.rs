//! Billing-specific error types.
//!
//! Every variant belongs to one [`ErrorKind`], which fixes its HTTP status:
//!
//! | Kind | HTTP Status |
//! |------|-------------|
//! | Validation | 400 |
//! | NotFound | 404 |
//! | Conflict | 400 |
//! | ExternalProcessor | status reported by the processor |
//! | Integrity | 500 |
//! | Internal | 500 |

use crate::domain::foundation::{
    CardId, DiscountId, DomainError, ErrorCode, SubscriptionId, UserId, ValidationError,
};
use crate::ports::PaymentError;

use super::{SubscriptionStage, SubscriptionStatus, UnknownPlanType};

/// Category of a billing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    ExternalProcessor,
    Integrity,
    Internal,
}

/// Billing errors.
#[derive(Debug, Clone)]
pub enum BillingError {
    /// Malformed input.
    ValidationFailed { field: String, message: String },

    /// Plan type is neither WEEKLY nor ANNUAL.
    UnknownPlanType(String),

    /// Discount code does not match any discount.
    InvalidDiscountCode(String),

    /// Discount code is already used by another discount.
    DuplicateDiscountCode(String),

    /// No user record for the authenticated id.
    UserNotFound(UserId),

    /// No discounts exist.
    NoDiscounts,

    /// The user has not applied a discount code.
    NoDiscountApplied(UserId),

    /// The user has no card with this id.
    CardNotFound(CardId),

    /// The user has no card on file to charge.
    NoCardOnFile(UserId),

    /// The user's summary has no subscription id to cancel.
    NoSubscriptionRecorded(UserId),

    /// No local record for a processor subscription.
    SubscriptionRecordNotFound(SubscriptionId),

    /// The user already has an active subscription.
    AlreadySubscribed(UserId),

    /// Cancellation requested for a subscription that is not active.
    SubscriptionNotActive {
        user_id: UserId,
        status: SubscriptionStatus,
    },

    /// The processor rejected a call.
    PaymentProcessor(PaymentError),

    /// A user references a discount that does not exist.
    DiscountNotFound(DiscountId),

    /// Stored data could not be interpreted.
    CorruptRecord { entity: String, reason: String },

    /// The processor returned a response the workflow cannot use.
    UnexpectedProcessorResponse(String),

    /// Storage or other infrastructure failure.
    Infrastructure(String),

    /// A create-subscription run failed after reaching the given stage.
    WorkflowFailed {
        stage: SubscriptionStage,
        source: Box<BillingError>,
    },
}

impl BillingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unknown_plan_type(value: impl Into<String>) -> Self {
        BillingError::UnknownPlanType(value.into())
    }

    pub fn invalid_discount_code(code: impl Into<String>) -> Self {
        BillingError::InvalidDiscountCode(code.into())
    }

    pub fn duplicate_discount_code(code: impl Into<String>) -> Self {
        BillingError::DuplicateDiscountCode(code.into())
    }

    pub fn user_not_found(user_id: UserId) -> Self {
        BillingError::UserNotFound(user_id)
    }

    pub fn no_discount_applied(user_id: UserId) -> Self {
        BillingError::NoDiscountApplied(user_id)
    }

    pub fn card_not_found(card_id: CardId) -> Self {
        BillingError::CardNotFound(card_id)
    }

    pub fn no_card_on_file(user_id: UserId) -> Self {
        BillingError::NoCardOnFile(user_id)
    }

    pub fn no_subscription_recorded(user_id: UserId) -> Self {
        BillingError::NoSubscriptionRecorded(user_id)
    }

    pub fn subscription_record_not_found(id: SubscriptionId) -> Self {
        BillingError::SubscriptionRecordNotFound(id)
    }

    pub fn already_subscribed(user_id: UserId) -> Self {
        BillingError::AlreadySubscribed(user_id)
    }

    pub fn not_active(user_id: UserId, status: SubscriptionStatus) -> Self {
        BillingError::SubscriptionNotActive { user_id, status }
    }

    pub fn discount_not_found(id: DiscountId) -> Self {
        BillingError::DiscountNotFound(id)
    }

    pub fn corrupt(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        BillingError::CorruptRecord {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub fn unexpected_response(message: impl Into<String>) -> Self {
        BillingError::UnexpectedProcessorResponse(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Wraps an error with the workflow stage it failed at.
    pub fn at_stage(self, stage: SubscriptionStage) -> Self {
        BillingError::WorkflowFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// The error without any workflow wrapper.
    pub fn root(&self) -> &BillingError {
        match self {
            BillingError::WorkflowFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::ValidationFailed { .. }
            | BillingError::UnknownPlanType(_)
            | BillingError::InvalidDiscountCode(_)
            | BillingError::NoDiscountApplied(_)
            | BillingError::NoCardOnFile(_) => ErrorKind::Validation,
            BillingError::UserNotFound(_)
            | BillingError::NoDiscounts
            | BillingError::CardNotFound(_)
            | BillingError::NoSubscriptionRecorded(_)
            | BillingError::SubscriptionRecordNotFound(_) => ErrorKind::NotFound,
            BillingError::DuplicateDiscountCode(_)
            | BillingError::AlreadySubscribed(_)
            | BillingError::SubscriptionNotActive { .. } => ErrorKind::Conflict,
            BillingError::PaymentProcessor(_) => ErrorKind::ExternalProcessor,
            BillingError::DiscountNotFound(_) | BillingError::CorruptRecord { .. } => {
                ErrorKind::Integrity
            }
            BillingError::UnexpectedProcessorResponse(_) | BillingError::Infrastructure(_) => {
                ErrorKind::Internal
            }
            BillingError::WorkflowFailed { source, .. } => source.kind(),
        }
    }

    /// Machine-readable code sent to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            BillingError::ValidationFailed { .. } => "VALIDATION_FAILED",
            BillingError::UnknownPlanType(_) => "UNKNOWN_PLAN_TYPE",
            BillingError::InvalidDiscountCode(_) => "INVALID_DISCOUNT_CODE",
            BillingError::DuplicateDiscountCode(_) => "DUPLICATE_DISCOUNT_CODE",
            BillingError::UserNotFound(_) => "USER_NOT_FOUND",
            BillingError::NoDiscounts => "NO_DISCOUNTS",
            BillingError::NoDiscountApplied(_) => "NO_DISCOUNT_APPLIED",
            BillingError::CardNotFound(_) => "CARD_NOT_FOUND",
            BillingError::NoCardOnFile(_) => "NO_CARD_ON_FILE",
            BillingError::NoSubscriptionRecorded(_) => "NO_SUBSCRIPTION",
            BillingError::SubscriptionRecordNotFound(_) => "SUBSCRIPTION_RECORD_NOT_FOUND",
            BillingError::AlreadySubscribed(_) => "ALREADY_SUBSCRIBED",
            BillingError::SubscriptionNotActive { .. } => "SUBSCRIPTION_NOT_ACTIVE",
            BillingError::PaymentProcessor(_) => "PAYMENT_PROCESSOR_ERROR",
            BillingError::DiscountNotFound(_) | BillingError::CorruptRecord { .. } => {
                "DATA_INTEGRITY_ERROR"
            }
            BillingError::UnexpectedProcessorResponse(_) | BillingError::Infrastructure(_) => {
                "INTERNAL_ERROR"
            }
            BillingError::WorkflowFailed { source, .. } => source.error_code(),
        }
    }

    /// Client-facing message. Integrity and internal errors stay generic.
    pub fn message(&self) -> String {
        match self {
            BillingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::UnknownPlanType(value) => format!("Invalid plan type: {}", value),
            BillingError::InvalidDiscountCode(code) => {
                format!("Discount code '{}' is not valid", code)
            }
            BillingError::DuplicateDiscountCode(code) => {
                format!("Discount code '{}' already exists", code)
            }
            BillingError::UserNotFound(_) => "User not found".to_string(),
            BillingError::NoDiscounts => "No discounts found".to_string(),
            BillingError::NoDiscountApplied(_) => {
                "Discount not applied for this user".to_string()
            }
            BillingError::CardNotFound(card_id) => format!("Card {} not found", card_id),
            BillingError::NoCardOnFile(_) => "No payment card on file".to_string(),
            BillingError::NoSubscriptionRecorded(_) => "No subscription found".to_string(),
            BillingError::SubscriptionRecordNotFound(id) => {
                format!("Subscription {} not found", id)
            }
            BillingError::AlreadySubscribed(_) => "Subscription is already active".to_string(),
            BillingError::SubscriptionNotActive { status, .. } => {
                format!("Subscription is not active (status {})", status)
            }
            BillingError::PaymentProcessor(err) => err.message(),
            BillingError::DiscountNotFound(_) | BillingError::CorruptRecord { .. } => {
                "Billing data is inconsistent".to_string()
            }
            BillingError::UnexpectedProcessorResponse(_) | BillingError::Infrastructure(_) => {
                "Internal server error".to_string()
            }
            BillingError::WorkflowFailed { source, .. } => source.message(),
        }
    }

    /// Full description for logs, including detail hidden from clients.
    pub fn log_detail(&self) -> String {
        match self {
            BillingError::DiscountNotFound(id) => {
                format!("user references missing discount {}", id)
            }
            BillingError::CorruptRecord { entity, reason } => {
                format!("corrupt {} record: {}", entity, reason)
            }
            BillingError::UnexpectedProcessorResponse(msg) => {
                format!("unexpected processor response: {}", msg)
            }
            BillingError::Infrastructure(msg) => msg.clone(),
            BillingError::PaymentProcessor(err) => err.to_string(),
            BillingError::WorkflowFailed { stage, source } => {
                format!("{} ({})", source.log_detail(), stage)
            }
            other => other.message(),
        }
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.log_detail())
    }
}

impl std::error::Error for BillingError {}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => BillingError::ValidationFailed {
                field: err.detail("field").unwrap_or("unknown").to_string(),
                message: err.message,
            },
            ErrorCode::DiscountCodeTaken => BillingError::DuplicateDiscountCode(
                err.detail("code").unwrap_or_default().to_string(),
            ),
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        BillingError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<UnknownPlanType> for BillingError {
    fn from(err: UnknownPlanType) -> Self {
        BillingError::UnknownPlanType(err.0)
    }
}

impl From<PaymentError> for BillingError {
    fn from(err: PaymentError) -> Self {
        BillingError::PaymentProcessor(err)
    }
}
