//! User repository port.
//!
//! Billing only reads users and writes its own fields; creating and deleting
//! users belongs to the wider platform.

use async_trait::async_trait;

use crate::domain::foundation::{BillingCustomerId, CardId, DiscountId, DomainError, UserId};
use crate::domain::user::{PaymentCard, UserAccount};

/// Repository port for the billing fields of user records.
///
/// Writes to a user that does not exist fail with `ErrorCode::UserNotFound`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, DomainError>;

    /// Store a billing customer id unless one is already set.
    ///
    /// Returns the id stored after the call, which is the existing id when
    /// another writer got there first.
    async fn set_billing_customer_id_if_absent(
        &self,
        id: &UserId,
        customer_id: &BillingCustomerId,
    ) -> Result<BillingCustomerId, DomainError>;

    /// Append a card to the user's cards.
    async fn add_payment_card(&self, id: &UserId, card: &PaymentCard) -> Result<(), DomainError>;

    /// Remove a card. Returns false when the user has no such card.
    async fn remove_payment_card(&self, id: &UserId, card_id: &CardId)
        -> Result<bool, DomainError>;

    /// Point the user at a discount.
    async fn set_discount(&self, id: &UserId, discount_id: &DiscountId) -> Result<(), DomainError>;
}
