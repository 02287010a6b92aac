//! User billing profile.
//!
//! The user record is owned by the wider platform; this module models the
//! fields billing reads and writes.

mod account;

pub use account::{PaymentCard, UserAccount};
