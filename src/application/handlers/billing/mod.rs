//! Billing command and query handlers.

mod cancel_subscription;
mod create_subscription;
mod discounted_price;
mod ensure_customer;
mod plan_catalog;
mod resolve_discount;

pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
pub use discounted_price::{DiscountedPrice, GetDiscountedPriceHandler, GetDiscountedPriceQuery};
pub use ensure_customer::CustomerProvisioner;
pub use plan_catalog::PlanCatalogManager;
pub use resolve_discount::DiscountResolver;
