//! Square payments processor adapter.
//!
//! Implements the `PaymentProcessor` port for Square, including:
//! - Customer creation
//! - Subscription plan catalog (plans and variations)
//! - Subscription create and cancel
//! - Cards on file
//!
//! # Configuration
//!
//! Required environment variables:
//! - `FANTASTIC_STORIES__PAYMENT__SQUARE_ACCESS_TOKEN`: Square access token
//! - `FANTASTIC_STORIES__PAYMENT__SQUARE_LOCATION_ID`: Location that owns subscriptions

mod mock_payment_processor;
mod square_adapter;
mod wire_types;

pub use mock_payment_processor::{MethodCall, MockPaymentProcessor};
pub use square_adapter::{SquareConfig, SquarePaymentProcessor};
