use serde::{Deserialize, Serialize};

use crate::domain::billing::SubscriptionSummary;
use crate::domain::foundation::{BillingCustomerId, CardId, DiscountId, UserId};

/// Card stored at the processor and mirrored on the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCard {
    pub id: CardId,
    pub brand: Option<String>,
    pub last_4: Option<String>,
    pub exp_month: Option<u32>,
    pub exp_year: Option<u32>,
    pub cardholder_name: Option<String>,
}

/// Billing view of a platform user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Set once, never overwritten.
    pub billing_customer_id: Option<BillingCustomerId>,
    /// The first card is the default payment source.
    pub payment_cards: Vec<PaymentCard>,
    pub discount_id: Option<DiscountId>,
    pub subscription: SubscriptionSummary,
    /// Bumped on every activation.
    pub subscription_generation: u32,
}

impl UserAccount {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            first_name: None,
            last_name: None,
            billing_customer_id: None,
            payment_cards: Vec::new(),
            discount_id: None,
            subscription: SubscriptionSummary::empty(),
            subscription_generation: 0,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    pub fn default_card(&self) -> Option<&PaymentCard> {
        self.payment_cards.first()
    }

    pub fn find_card(&self, card_id: &CardId) -> Option<&PaymentCard> {
        self.payment_cards.iter().find(|c| &c.id == card_id)
    }

    pub fn has_active_subscription(&self) -> bool {
        self.subscription.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::SubscriptionStatus;
    use crate::domain::foundation::SubscriptionId;

    fn card(id: &str) -> PaymentCard {
        PaymentCard {
            id: CardId::new(id).unwrap(),
            brand: Some("VISA".to_string()),
            last_4: Some("1111".to_string()),
            exp_month: Some(12),
            exp_year: Some(2030),
            cardholder_name: None,
        }
    }

    #[test]
    fn default_card_is_first() {
        let mut user = UserAccount::new(UserId::new("u").unwrap(), "u@example.com");
        assert!(user.default_card().is_none());

        user.payment_cards = vec![card("first"), card("second")];
        assert_eq!(user.default_card().unwrap().id.as_str(), "first");
        assert!(user.find_card(&CardId::new("second").unwrap()).is_some());
        assert!(user.find_card(&CardId::new("third").unwrap()).is_none());
    }

    #[test]
    fn active_subscription_follows_summary() {
        let mut user = UserAccount::new(UserId::new("u").unwrap(), "u@example.com");
        assert!(!user.has_active_subscription());

        user.subscription = SubscriptionSummary::new(
            SubscriptionId::new("sub").unwrap(),
            SubscriptionStatus::Active,
        );
        assert!(user.has_active_subscription());
    }

    #[test]
    fn card_serializes_for_json_storage() {
        let json = serde_json::to_value(card("c1")).unwrap();
        assert_eq!(json["id"], "c1");
        assert_eq!(json["last_4"], "1111");
    }
}
