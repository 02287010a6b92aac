//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `UserRepository` - Billing fields of platform users
//! - `DiscountRepository` - Discount records
//! - `SubscriptionStore` - Subscription records and transactional state changes
//! - `PaymentProcessor` - External payments API

mod discount_repository;
mod payment_processor;
mod subscription_store;
mod user_repository;

pub use discount_repository::DiscountRepository;
pub use payment_processor::{
    CatalogObject, CatalogObjectDraft, CatalogObjectKind, CatalogPage, CreateCardRequest,
    CreateCustomerRequest, CreateSubscriptionRequest, PaymentError, PaymentProcessor,
    PricingPhase, ProcessorErrorDetail, ProcessorSubscription, ProcessorSubscriptionStatus,
    UpsertCatalogObjectRequest,
};
pub use subscription_store::SubscriptionStore;
pub use user_repository::UserRepository;
