//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum REST API
//! - `postgres` - PostgreSQL stores (sqlx)
//! - `square` - Square payments API client and a recording mock
//! - `storage` - In-memory stores for development and tests

pub mod http;
pub mod postgres;
pub mod square;
pub mod storage;

pub use square::{MockPaymentProcessor, SquareConfig, SquarePaymentProcessor};
pub use storage::InMemoryBillingStore;
