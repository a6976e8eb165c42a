//! Idempotency token registry
//!
//! Tokens are registered in the same transaction as the payment they
//! protect. The primary key on the token turns a duplicate registration
//! into a unique violation that the payments repository resolves by
//! returning the stored record.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{IdempotencyKey, PaymentId};

use crate::error::ServiceError;

#[derive(Debug, FromRow)]
struct IdempotencyRow {
    token: Uuid,
    payment_id: Uuid,
    created_at: DateTime<Utc>,
}

/// A registered idempotency token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub token: IdempotencyKey,
    pub payment_id: PaymentId,
    pub created_at: DateTime<Utc>,
}

impl From<IdempotencyRow> for IdempotencyRecord {
    fn from(row: IdempotencyRow) -> Self {
        Self {
            token: IdempotencyKey::from(row.token),
            payment_id: PaymentId::from(row.payment_id),
            created_at: row.created_at,
        }
    }
}

/// Registers a token inside an open transaction
///
/// A duplicate token surfaces as a unique violation, which the caller
/// treats as "someone else got here first".
pub(crate) async fn register_token_in_tx(
    conn: &mut PgConnection,
    token: IdempotencyKey,
    payment_id: PaymentId,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO idempotency_records (token, payment_id, created_at) VALUES ($1, $2, NOW())",
    )
    .bind(*token.as_uuid())
    .bind(Uuid::from(payment_id))
    .execute(conn)
    .await?;
    Ok(())
}

/// Repository for the idempotency token registry
#[derive(Debug, Clone)]
pub struct IdempotencyRepository {
    pool: PgPool,
}

impl IdempotencyRepository {
    /// Creates a new IdempotencyRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Looks up a token registration
    pub async fn find(
        &self,
        token: IdempotencyKey,
    ) -> Result<Option<IdempotencyRecord>, ServiceError> {
        let row = sqlx::query_as::<_, IdempotencyRow>(
            "SELECT token, payment_id, created_at FROM idempotency_records WHERE token = $1",
        )
        .bind(*token.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(IdempotencyRecord::from))
    }
}
