//! PostgreSQL implementation of UserRepository.
//!
//! Only the billing columns of `users` are read or written here. Cards are a
//! JSONB array whose first element is the default card.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{SubscriptionStatus, SubscriptionSummary};
use crate::domain::foundation::{
    BillingCustomerId, CardId, DiscountId, DomainError, ErrorCode, SubscriptionId, UserId,
};
use crate::domain::user::{PaymentCard, UserAccount};
use crate::ports::UserRepository;

/// PostgreSQL implementation of the UserRepository port.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user's billing fields.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    billing_customer_id: Option<String>,
    payment_cards: Json<Vec<PaymentCard>>,
    discount_id: Option<Uuid>,
    subscription_id: Option<String>,
    subscription_status: String,
    subscription_generation: i32,
}

pub(super) const USER_COLUMNS: &str = "id, email, first_name, last_name, billing_customer_id, \
     payment_cards, discount_id, subscription_id, subscription_status, subscription_generation";

impl TryFrom<UserRow> for UserAccount {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status: SubscriptionStatus = row
            .subscription_status
            .parse()
            .map_err(|e| DomainError::database("Invalid subscription_status", e))?;

        Ok(UserAccount {
            id: UserId::new(row.id).map_err(|e| DomainError::database("Invalid user id", e))?,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            billing_customer_id: row
                .billing_customer_id
                .map(BillingCustomerId::new)
                .transpose()
                .map_err(|e| DomainError::database("Invalid billing_customer_id", e))?,
            payment_cards: row.payment_cards.0,
            discount_id: row.discount_id.map(DiscountId::from_uuid),
            subscription: SubscriptionSummary {
                subscription_id: row
                    .subscription_id
                    .map(SubscriptionId::new)
                    .transpose()
                    .map_err(|e| DomainError::database("Invalid subscription_id", e))?,
                status,
            },
            subscription_generation: u32::try_from(row.subscription_generation)
                .map_err(|e| DomainError::database("Invalid subscription_generation", e))?,
        })
    }
}

pub(super) fn user_not_found(id: &UserId) -> DomainError {
    DomainError::new(ErrorCode::UserNotFound, format!("User {} not found", id))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to fetch user", e))?;

        row.map(UserAccount::try_from).transpose()
    }

    async fn set_billing_customer_id_if_absent(
        &self,
        id: &UserId,
        customer_id: &BillingCustomerId,
    ) -> Result<BillingCustomerId, DomainError> {
        let stored: Option<(String,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET billing_customer_id = COALESCE(billing_customer_id, $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING billing_customer_id
            "#,
        )
        .bind(id.as_str())
        .bind(customer_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to set billing customer", e))?;

        let (stored,) = stored.ok_or_else(|| user_not_found(id))?;
        BillingCustomerId::new(stored)
            .map_err(|e| DomainError::database("Invalid billing_customer_id", e))
    }

    async fn add_payment_card(&self, id: &UserId, card: &PaymentCard) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET payment_cards = payment_cards || $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(Json(vec![card]))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to add payment card", e))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }

    async fn remove_payment_card(
        &self,
        id: &UserId,
        card_id: &CardId,
    ) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        let row: Option<(Json<Vec<PaymentCard>>,)> =
            sqlx::query_as("SELECT payment_cards FROM users WHERE id = $1 FOR UPDATE")
                .bind(id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DomainError::database("Failed to lock user", e))?;

        let (Json(mut cards),) = row.ok_or_else(|| user_not_found(id))?;
        let before = cards.len();
        cards.retain(|c| &c.id != card_id);
        if cards.len() == before {
            return Ok(false);
        }

        sqlx::query("UPDATE users SET payment_cards = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_str())
            .bind(Json(cards))
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to remove payment card", e))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit card removal", e))?;
        Ok(true)
    }

    async fn set_discount(&self, id: &UserId, discount_id: &DiscountId) -> Result<(), DomainError> {
        let result =
            sqlx::query("UPDATE users SET discount_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_str())
                .bind(discount_id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to set discount", e))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }
}
