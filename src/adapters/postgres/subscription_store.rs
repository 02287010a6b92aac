//! PostgreSQL implementation of SubscriptionStore.
//!
//! Activation and cancellation each write `users` and `subscriptions` inside
//! one transaction, with the rows involved locked `FOR UPDATE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::billing::{PlanType, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{
    BillingCustomerId, CardId, DomainError, ErrorCode, PlanId, PlanVariationId, SubscriptionId,
    Timestamp, UserId,
};
use crate::ports::SubscriptionStore;

use super::user_repository::user_not_found;

/// PostgreSQL implementation of the SubscriptionStore port.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: String,
    user_id: String,
    plan_type: String,
    billing_customer_id: String,
    plan_id: String,
    plan_variation_id: String,
    card_id: String,
    price_cents: i64,
    status: String,
    created_at: DateTime<Utc>,
    start_date: DateTime<Utc>,
    canceled_date: Option<DateTime<Utc>>,
}

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_type, billing_customer_id, plan_id, \
     plan_variation_id, card_id, price_cents, status, created_at, start_date, canceled_date";

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let corrupt = |column: &str, e: &dyn std::fmt::Display| {
            DomainError::database(&format!("Invalid {}", column), e)
        };

        Ok(SubscriptionRecord {
            id: SubscriptionId::new(row.id).map_err(|e| corrupt("id", &e))?,
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", &e))?,
            plan_type: row
                .plan_type
                .parse::<PlanType>()
                .map_err(|e| corrupt("plan_type", &e))?,
            billing_customer_id: BillingCustomerId::new(row.billing_customer_id)
                .map_err(|e| corrupt("billing_customer_id", &e))?,
            plan_id: PlanId::new(row.plan_id).map_err(|e| corrupt("plan_id", &e))?,
            plan_variation_id: PlanVariationId::new(row.plan_variation_id)
                .map_err(|e| corrupt("plan_variation_id", &e))?,
            card_id: CardId::new(row.card_id).map_err(|e| corrupt("card_id", &e))?,
            price_cents: u64::try_from(row.price_cents)
                .map_err(|e| corrupt("price_cents", &e))?,
            status: row
                .status
                .parse::<SubscriptionStatus>()
                .map_err(|e| corrupt("status", &e))?,
            created_at: Timestamp::from_datetime(row.created_at),
            start_date: Timestamp::from_datetime(row.start_date),
            canceled_date: row.canceled_date.map(Timestamp::from_datetime),
        })
    }
}

fn already_active(user_id: &UserId) -> DomainError {
    DomainError::new(
        ErrorCode::SubscriptionAlreadyActive,
        format!("User {} already has an active subscription", user_id),
    )
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn record_activation(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT subscription_status FROM users WHERE id = $1 FOR UPDATE")
                .bind(record.user_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DomainError::database("Failed to lock user", e))?;

        let (status,) = current.ok_or_else(|| user_not_found(&record.user_id))?;
        if status == SubscriptionStatus::Active.as_str() {
            return Err(already_active(&record.user_id));
        }

        sqlx::query(
            r#"
            UPDATE users
            SET subscription_id = $2,
                subscription_status = $3,
                subscription_generation = subscription_generation + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(record.id.as_str())
        .bind(record.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to update user subscription", e))?;

        let price_cents = i64::try_from(record.price_cents)
            .map_err(|e| DomainError::database("Price out of range", e))?;

        sqlx::query(&format!(
            "INSERT INTO subscriptions ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(record.id.as_str())
        .bind(record.user_id.as_str())
        .bind(record.plan_type.cadence())
        .bind(record.billing_customer_id.as_str())
        .bind(record.plan_id.as_str())
        .bind(record.plan_variation_id.as_str())
        .bind(record.card_id.as_str())
        .bind(price_cents)
        .bind(record.status.as_str())
        .bind(record.created_at.as_datetime())
        .bind(record.start_date.as_datetime())
        .bind(record.canceled_date.map(|d| *d.as_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscriptions_one_active_per_user") {
                    return already_active(&record.user_id);
                }
            }
            DomainError::database("Failed to insert subscription", e)
        })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit activation", e))
    }

    async fn record_cancellation(
        &self,
        user_id: &UserId,
        subscription_id: &SubscriptionId,
        canceled_date: Timestamp,
    ) -> Result<SubscriptionRecord, DomainError> {
        let mut tx = self.begin().await?;

        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1 FOR UPDATE",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(subscription_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to lock subscription", e))?;

        let mut record: SubscriptionRecord = row
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    format!("Subscription {} not found", subscription_id),
                )
            })?
            .try_into()?;

        record
            .cancel(canceled_date)
            .map_err(|e| DomainError::new(ErrorCode::SubscriptionNotActive, e.to_string()))?;

        sqlx::query("UPDATE subscriptions SET status = $2, canceled_date = $3 WHERE id = $1")
            .bind(record.id.as_str())
            .bind(record.status.as_str())
            .bind(canceled_date.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to update subscription", e))?;

        let cleared = sqlx::query(
            r#"
            UPDATE users
            SET subscription_id = NULL,
                subscription_status = 'NONE',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to clear user subscription", e))?;

        if cleared.rows_affected() == 0 {
            return Err(user_not_found(user_id));
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit cancellation", e))?;
        Ok(record)
    }
}
