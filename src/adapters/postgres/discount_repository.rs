//! PostgreSQL implementation of DiscountRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{Discount, DiscountCode};
use crate::domain::foundation::{DiscountId, DomainError, ErrorCode, Percentage, Timestamp};
use crate::ports::DiscountRepository;

/// PostgreSQL implementation of the DiscountRepository port.
pub struct PostgresDiscountRepository {
    pool: PgPool,
}

impl PostgresDiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: Uuid,
    code: String,
    percentage_bp: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for Discount {
    type Error = DomainError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        let bp = u16::try_from(row.percentage_bp)
            .map_err(|e| DomainError::database("Invalid percentage_bp", e))?;

        Ok(Discount {
            id: DiscountId::from_uuid(row.id),
            code: DiscountCode::new(row.code)
                .map_err(|e| DomainError::database("Invalid discount code", e))?,
            percentage: Percentage::from_basis_points(bp)
                .map_err(|e| DomainError::database("Invalid percentage_bp", e))?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl DiscountRepository for PostgresDiscountRepository {
    async fn find_by_id(&self, id: &DiscountId) -> Result<Option<Discount>, DomainError> {
        let row: Option<DiscountRow> = sqlx::query_as(
            "SELECT id, code, percentage_bp, created_at FROM discounts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch discount", e))?;

        row.map(Discount::try_from).transpose()
    }

    async fn find_by_code(&self, code: &DiscountCode) -> Result<Option<Discount>, DomainError> {
        let row: Option<DiscountRow> = sqlx::query_as(
            "SELECT id, code, percentage_bp, created_at FROM discounts WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch discount", e))?;

        row.map(Discount::try_from).transpose()
    }

    async fn save(&self, discount: &Discount) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO discounts (id, code, percentage_bp, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(discount.id.as_uuid())
        .bind(discount.code.as_str())
        .bind(i32::from(discount.percentage.basis_points()))
        .bind(discount.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("discounts_code_key") {
                    return DomainError::new(
                        ErrorCode::DiscountCodeTaken,
                        format!("Discount code {} already exists", discount.code),
                    )
                    .with_detail("code", discount.code.as_str());
                }
            }
            DomainError::database("Failed to save discount", e)
        })?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Discount>, DomainError> {
        let rows: Vec<DiscountRow> = sqlx::query_as(
            "SELECT id, code, percentage_bp, created_at FROM discounts ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list discounts", e))?;

        rows.into_iter().map(Discount::try_from).collect()
    }
}
