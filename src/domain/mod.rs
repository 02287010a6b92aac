//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `billing` - Plans, pricing, discounts and the subscription lifecycle
//! - `user` - The billing fields of a platform user

pub mod billing;
pub mod foundation;
pub mod user;
