//! Subscription status, the per-user summary and the subscription record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    BillingCustomerId, CardId, PlanId, PlanVariationId, StateMachine, SubscriptionId, Timestamp,
    UserId, ValidationError,
};

use super::PlanType;

/// Lifecycle status of a subscription.
///
/// ```text
/// None ──► Active ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    #[default]
    None,
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "NONE",
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (SubscriptionStatus::None, SubscriptionStatus::Active)
                | (SubscriptionStatus::Active, SubscriptionStatus::Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SubscriptionStatus::None => vec![SubscriptionStatus::Active],
            SubscriptionStatus::Active => vec![SubscriptionStatus::Cancelled],
            SubscriptionStatus::Cancelled => vec![],
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(SubscriptionStatus::None),
            "ACTIVE" => Ok(SubscriptionStatus::Active),
            "CANCELLED" => Ok(SubscriptionStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Current-subscription summary embedded in the user record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub subscription_id: Option<SubscriptionId>,
    pub status: SubscriptionStatus,
}

impl SubscriptionSummary {
    /// The cleared summary of a user with no current subscription.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(subscription_id: SubscriptionId, status: SubscriptionStatus) -> Self {
        Self {
            subscription_id: Some(subscription_id),
            status,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// Local record of a processor subscription, keyed by the processor's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub billing_customer_id: BillingCustomerId,
    pub plan_id: PlanId,
    pub plan_variation_id: PlanVariationId,
    pub card_id: CardId,
    pub price_cents: u64,
    pub status: SubscriptionStatus,
    pub created_at: Timestamp,
    pub start_date: Timestamp,
    pub canceled_date: Option<Timestamp>,
}

impl SubscriptionRecord {
    /// The user summary that mirrors this record.
    pub fn summary(&self) -> SubscriptionSummary {
        SubscriptionSummary::new(self.id.clone(), self.status)
    }

    /// Marks the record cancelled as of the processor-reported date.
    pub fn cancel(&mut self, canceled_date: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Cancelled)?;
        self.canceled_date = Some(canceled_date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: SubscriptionStatus) -> SubscriptionRecord {
        let now = Timestamp::now();
        SubscriptionRecord {
            id: SubscriptionId::new("sub-1").unwrap(),
            user_id: UserId::new("user-1").unwrap(),
            plan_type: PlanType::Weekly,
            billing_customer_id: BillingCustomerId::new("cust-1").unwrap(),
            plan_id: PlanId::new("plan-1").unwrap(),
            plan_variation_id: PlanVariationId::new("var-1").unwrap(),
            card_id: CardId::new("card-1").unwrap(),
            price_cents: 100,
            status,
            created_at: now,
            start_date: now,
            canceled_date: None,
        }
    }

    #[test]
    fn status_machine_only_moves_forward() {
        use SubscriptionStatus::*;
        assert!(None.can_transition_to(&Active));
        assert!(Active.can_transition_to(&Cancelled));
        assert!(!Cancelled.can_transition_to(&Active));
        assert!(!None.can_transition_to(&Cancelled));
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn status_parses_its_own_display() {
        for status in [
            SubscriptionStatus::None,
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<SubscriptionStatus>(), Ok(status));
        }
        assert!("PAUSED".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn cancelling_active_record_sets_date() {
        let mut rec = record(SubscriptionStatus::Active);
        let when = Timestamp::parse_date("2024-05-01").unwrap();
        rec.cancel(when).unwrap();
        assert_eq!(rec.status, SubscriptionStatus::Cancelled);
        assert_eq!(rec.canceled_date, Some(when));
    }

    #[test]
    fn cancelling_cancelled_record_fails_unchanged() {
        let mut rec = record(SubscriptionStatus::Cancelled);
        assert!(rec.cancel(Timestamp::now()).is_err());
        assert!(rec.canceled_date.is_none());
    }

    #[test]
    fn empty_summary_is_not_active() {
        let summary = SubscriptionSummary::empty();
        assert!(!summary.is_active());
        assert!(summary.subscription_id.is_none());
        assert!(record(SubscriptionStatus::Active).summary().is_active());
    }
}
