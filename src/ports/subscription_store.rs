//! Subscription store port.
//!
//! Subscription state lives in two places: the subscription record and the
//! summary embedded in the user record. Both writes that change them go
//! through this port as single transactions.

use async_trait::async_trait;

use crate::domain::billing::SubscriptionRecord;
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_by_id(&self, id: &SubscriptionId)
        -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Atomically insert the record, point the owner's summary at it and bump
    /// the owner's subscription generation.
    ///
    /// Fails with `ErrorCode::SubscriptionAlreadyActive` and writes nothing if
    /// the owner's summary is already active, `ErrorCode::UserNotFound` if the
    /// owner does not exist.
    async fn record_activation(&self, record: &SubscriptionRecord) -> Result<(), DomainError>;

    /// Atomically mark the record cancelled and clear the user's summary.
    ///
    /// Fails with `ErrorCode::SubscriptionNotFound` if the record does not
    /// exist and `ErrorCode::SubscriptionNotActive` if it is not active;
    /// neither write happens in those cases.
    async fn record_cancellation(
        &self,
        user_id: &UserId,
        subscription_id: &SubscriptionId,
        canceled_date: Timestamp,
    ) -> Result<SubscriptionRecord, DomainError>;
}
