//! Discount command and query handlers.

mod add_discount;
mod applied_discount;
mod apply_discount;
mod list_discounts;

pub use add_discount::{AddDiscountCommand, AddDiscountHandler};
pub use applied_discount::GetAppliedDiscountHandler;
pub use apply_discount::{ApplyDiscountCommand, ApplyDiscountHandler};
pub use list_discounts::ListDiscountsHandler;
