//! Fantastic Stories - Subscription billing and discount pricing
//!
//! Computes discounted prices, provisions the Square subscription plan and
//! its per-cadence variations, stores cards on file, and creates and cancels
//! recurring subscriptions, keeping the user record and the subscription
//! record consistent.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
