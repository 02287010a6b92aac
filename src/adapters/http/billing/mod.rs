//! HTTP adapter for billing endpoints.
//!
//! - `POST /subscriptions/subscription` - Subscribe to a plan
//! - `POST /subscriptions/cancel-subscription` - Cancel the active subscription
//! - `GET /users/discounted-price?planType=` - Price preview
//! - `POST /discount/add-discount` - Create a discount code
//! - `POST /discount/apply-discount` - Apply a discount code
//! - `GET /discount/discounted-price` - The caller's applied discount
//! - `GET /discount/discounts` - List discounts
//! - `POST /payments/create-customer-card` - Store a card
//! - `GET /payments/get-user-card` - List stored cards
//! - `DELETE /payments/delete-customer-card` - Remove a stored card

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingAppState;
pub use routes::billing_router;
