//! Billing domain: plans, pricing, discounts and subscriptions.

mod discount;
mod errors;
mod idempotency;
mod plan;
pub mod pricing;
mod subscription;
mod workflow;

pub use discount::{Discount, DiscountCode};
pub use errors::{BillingError, ErrorKind};
pub use idempotency::{hex_encode, IdempotencyKey};
pub use plan::{PlanType, UnknownPlanType, PLAN_NAME};
pub use pricing::{compute_price, price_for};
pub use subscription::{SubscriptionRecord, SubscriptionStatus, SubscriptionSummary};
pub use workflow::{SubscriptionStage, SubscriptionWorkflow, WorkflowStep};
