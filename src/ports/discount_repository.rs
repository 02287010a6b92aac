//! Discount repository port.

use async_trait::async_trait;

use crate::domain::billing::{Discount, DiscountCode};
use crate::domain::foundation::{DiscountId, DomainError};

/// Repository port for discount records.
#[async_trait]
pub trait DiscountRepository: Send + Sync {
    async fn find_by_id(&self, id: &DiscountId) -> Result<Option<Discount>, DomainError>;

    async fn find_by_code(&self, code: &DiscountCode) -> Result<Option<Discount>, DomainError>;

    /// Insert a new discount.
    ///
    /// Fails with `ErrorCode::DiscountCodeTaken` (detail `code`) when the code
    /// is already used.
    async fn save(&self, discount: &Discount) -> Result<(), DomainError>;

    /// All discounts, oldest first.
    async fn list(&self) -> Result<Vec<Discount>, DomainError>;
}
