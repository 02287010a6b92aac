//! HTTP adapters - REST API implementations.

pub mod auth;
pub mod billing;
pub mod error;
pub mod extract;
pub mod router;

pub use auth::AuthenticatedUser;
pub use billing::{billing_router, BillingAppState};
pub use error::{BillingApiError, ErrorResponse};
pub use extract::JsonBody;
pub use router::app_router;
