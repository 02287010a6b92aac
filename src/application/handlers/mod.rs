//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod billing;
pub mod discount;
pub mod payments;

pub use billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
    CustomerProvisioner, DiscountedPrice, GetDiscountedPriceHandler, GetDiscountedPriceQuery,
};
pub use discount::{
    AddDiscountCommand, AddDiscountHandler, ApplyDiscountCommand, ApplyDiscountHandler,
    GetAppliedDiscountHandler, ListDiscountsHandler,
};
pub use payments::{
    AddCardCommand, AddCardHandler, ListCardsHandler, RemoveCardCommand, RemoveCardHandler,
};
