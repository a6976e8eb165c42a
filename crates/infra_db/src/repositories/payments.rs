//! Payments repository implementation
//!
//! Database access for payment records: trip-fare payments, externally
//! initiated payments with idempotency tokens, settlement confirmation
//! and cancellation with refunds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use core_kernel::{AccountId, CoreError, IdempotencyKey, Money, PaymentId, TripId};
use domain_payment::{PaymentCancelOutcome, PaymentMethod, PaymentRecord, PaymentStatus};
use domain_pix::{Merchant, PixPayload};
use domain_trip::TripStatus;

use crate::error::{DatabaseError, ServiceError};
use crate::repositories::idempotency::register_token_in_tx;
use crate::repositories::trips::{lock_trip, reverse_fare, store_trip_status};

/// Length of the transaction reference embedded in the pix payload
const PIX_REFERENCE_LEN: usize = 25;

#[derive(Debug, FromRow)]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub trip_id: Option<Uuid>,
    pub payer_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub installments: i32,
    pub installment_amount: Option<Decimal>,
    pub status: String,
    pub token: Option<Uuid>,
    pub qr_payload: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRow {
    pub(crate) fn into_payment(self) -> Result<PaymentRecord, DatabaseError> {
        let method = PaymentMethod::parse(&self.method).ok_or_else(|| {
            DatabaseError::CorruptRow(format!("unknown payment method '{}'", self.method))
        })?;
        let status = PaymentStatus::parse(&self.status).ok_or_else(|| {
            DatabaseError::CorruptRow(format!("unknown payment status '{}'", self.status))
        })?;
        let installments = u32::try_from(self.installments).map_err(|_| {
            DatabaseError::CorruptRow(format!("negative installments {}", self.installments))
        })?;
        Ok(PaymentRecord {
            id: PaymentId::from(self.id),
            trip_id: self.trip_id.map(TripId::from),
            payer_id: AccountId::from(self.payer_id),
            amount: Money::new(self.amount),
            method,
            installments,
            installment_amount: self.installment_amount.map(Money::new),
            status,
            token: self.token.map(IdempotencyKey::from),
            qr_payload: self.qr_payload,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, trip_id, payer_id, amount, method, installments,
           installment_amount, status, token, qr_payload, created_at, updated_at
    FROM payments
"#;

async fn insert_payment(
    conn: &mut PgConnection,
    payment: &PaymentRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, trip_id, payer_id, amount, method, installments,
            installment_amount, status, token, qr_payload, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(Uuid::from(payment.id))
    .bind(payment.trip_id.map(Uuid::from))
    .bind(Uuid::from(payment.payer_id))
    .bind(payment.amount.amount())
    .bind(payment.method.as_str())
    .bind(payment.installments as i32)
    .bind(payment.installment_amount.map(|m| m.amount()))
    .bind(payment.status.as_str())
    .bind(payment.token.map(|t| *t.as_uuid()))
    .bind(payment.qr_payload.as_deref())
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn store_payment_status(
    conn: &mut PgConnection,
    payment: &PaymentRecord,
) -> Result<(), ServiceError> {
    sqlx::query("UPDATE payments SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(payment.status.as_str())
        .bind(payment.updated_at)
        .bind(Uuid::from(payment.id))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Cancels the payment attached to a trip, if any
///
/// Runs under the trip row lock held by the caller, so it cannot race
/// with settlement or another cancellation of the same payment.
pub(crate) async fn cancel_trip_payment_in_tx(
    conn: &mut PgConnection,
    trip_id: TripId,
) -> Result<(), ServiceError> {
    let row = sqlx::query_as::<_, PaymentRow>(
        &format!("{SELECT_PAYMENT} WHERE trip_id = $1 FOR UPDATE"),
    )
    .bind(Uuid::from(trip_id))
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        let mut payment = row.into_payment().map_err(ServiceError::Database)?;
        if payment.cancel().map_err(CoreError::from)? != PaymentCancelOutcome::NoOp {
            store_payment_status(&mut *conn, &payment).await?;
        }
    }
    Ok(())
}

/// Builds the copy-and-paste payload for a pix payment
///
/// The transaction reference is the payment identifier in simple form,
/// clipped to the 25-character field limit.
fn encode_pix_payload(
    merchant: &Merchant,
    payment_id: PaymentId,
    amount: Money,
) -> Result<String, ServiceError> {
    let reference: String = payment_id
        .as_uuid()
        .simple()
        .to_string()
        .chars()
        .take(PIX_REFERENCE_LEN)
        .collect();
    let payload = PixPayload::new(merchant.clone(), amount, reference).map_err(CoreError::from)?;
    Ok(payload.encode())
}

/// Repository for payment records
///
/// Carries the platform merchant descriptor used to encode pix payloads
/// for externally initiated payments.
#[derive(Debug, Clone)]
pub struct PaymentsRepository {
    pool: PgPool,
    merchant: Merchant,
}

impl PaymentsRepository {
    /// Creates a new PaymentsRepository with the given pool and merchant
    pub fn new(pool: PgPool, merchant: Merchant) -> Self {
        Self { pool, merchant }
    }

    /// Creates the payment record for a trip fare
    ///
    /// The amount is the trip total; a trip can carry at most one payment.
    ///
    /// # Errors
    ///
    /// - `ConflictError` if the trip already has a payment or is terminal
    /// - `ValidationError` for an installment count the method rejects
    #[instrument(skip(self))]
    pub async fn create_trip_payment(
        &self,
        trip_id: TripId,
        method: PaymentMethod,
        installments: u32,
    ) -> Result<PaymentRecord, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let trip = lock_trip(&mut tx, trip_id).await?;
        if trip.status.is_terminal() {
            return Err(CoreError::conflict(format!(
                "trip {} is {} and cannot take a payment",
                trip_id, trip.status
            ))
            .into());
        }

        let mut payment =
            PaymentRecord::new(Some(trip_id), trip.payer_id, trip.total, method, installments)
                .map_err(CoreError::from)?;
        if method.has_qr_payload() {
            let encoded = encode_pix_payload(&self.merchant, payment.id, payment.amount)?;
            payment = payment.with_qr_payload(encoded);
        }

        insert_payment(&mut tx, &payment)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateEntry(_) => ServiceError::Domain(CoreError::conflict(
                    format!("trip {} already has a payment", trip_id),
                )),
                other => ServiceError::Database(other),
            })?;

        tx.commit().await?;
        info!(payment_id = %payment.id, %trip_id, "trip payment created");
        Ok(payment)
    }

    /// Creates an externally initiated pix payment
    ///
    /// Idempotent on `token`: the first request creates the payment and
    /// every retry with the same token returns the stored record without
    /// creating anything. Two racing first requests are resolved by the
    /// unique constraint on the token; the loser reads back the winner's
    /// record.
    #[instrument(skip(self))]
    pub async fn create_external_payment(
        &self,
        payer_id: AccountId,
        amount: Money,
        token: IdempotencyKey,
    ) -> Result<PaymentRecord, ServiceError> {
        if let Some(existing) = self.find_by_token(token).await? {
            info!(payment_id = %existing.id, %token, "idempotent replay");
            return Ok(existing);
        }

        let mut payment =
            PaymentRecord::new_external(payer_id, amount, token).map_err(CoreError::from)?;
        let encoded = encode_pix_payload(&self.merchant, payment.id, payment.amount)?;
        payment = payment.with_qr_payload(encoded);

        let mut tx = self.pool.begin().await?;
        let inserted = async {
            insert_payment(&mut tx, &payment).await?;
            register_token_in_tx(&mut tx, token, payment.id).await?;
            Ok::<_, sqlx::Error>(())
        }
        .await;

        match inserted {
            Ok(()) => {
                tx.commit().await?;
                info!(payment_id = %payment.id, %token, "external payment created");
                Ok(payment)
            }
            Err(e) => match DatabaseError::from(e) {
                // Lost the race: the same token landed first in another
                // transaction. Return its payment.
                DatabaseError::DuplicateEntry(_) => {
                    tx.rollback().await?;
                    self.find_by_token(token).await?.ok_or_else(|| {
                        ServiceError::Database(DatabaseError::CorruptRow(format!(
                            "token {} registered without a payment",
                            token
                        )))
                    })
                }
                other => Err(ServiceError::Database(other)),
            },
        }
    }

    /// Confirms settlement of a deferred payment
    #[instrument(skip(self))]
    pub async fn mark_paid(&self, id: PaymentId) -> Result<PaymentRecord, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut payment = self.lock_payment(&mut tx, id).await?;
        payment.mark_paid().map_err(CoreError::from)?;
        store_payment_status(&mut tx, &payment).await?;
        tx.commit().await?;
        info!(payment_id = %id, "payment settled");
        Ok(payment)
    }

    /// Cancels a payment, refunding it when already settled
    ///
    /// A pending payment is cancelled in place; no ledger balances move
    /// and an attached trip stays as it is. Refunding a settled trip
    /// payment cancels the trip too, which reverses the fare transfer;
    /// the trip row lock and its status guard keep that reversal
    /// exactly-once no matter whether the cancellation arrives through
    /// the trip or through the payment.
    #[instrument(skip(self))]
    pub async fn cancel_payment(&self, id: PaymentId) -> Result<PaymentRecord, ServiceError> {
        let mut tx = self.pool.begin().await?;

        // Lock order matches cancel_trip: trip row first, then payment.
        let trip_id = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT trip_id FROM payments WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::not_found("payment", id))?;

        let trip = match trip_id {
            Some(trip_id) => Some(lock_trip(&mut tx, TripId::from(trip_id)).await?),
            None => None,
        };
        let mut payment = self.lock_payment(&mut tx, id).await?;

        match payment.cancel().map_err(CoreError::from)? {
            PaymentCancelOutcome::NoOp => {
                tx.rollback().await?;
                return Ok(payment);
            }
            PaymentCancelOutcome::CancelledPending => {
                store_payment_status(&mut tx, &payment).await?;
            }
            PaymentCancelOutcome::RefundedPaid => {
                if let Some(mut trip) = trip {
                    if trip.status != TripStatus::Cancelled {
                        trip.cancel().map_err(CoreError::from)?;
                        reverse_fare(&mut tx, &trip).await?;
                        store_trip_status(&mut tx, &trip).await?;
                    }
                }
                store_payment_status(&mut tx, &payment).await?;
            }
        }

        tx.commit().await?;
        info!(payment_id = %id, status = %payment.status, "payment cancelled");
        Ok(payment)
    }

    /// Fetches a payment by id
    pub async fn find_payment(&self, id: PaymentId) -> Result<PaymentRecord, ServiceError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{SELECT_PAYMENT} WHERE id = $1"))
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("payment", id))?;
        row.into_payment().map_err(ServiceError::Database)
    }

    /// Fetches the payment created under an idempotency token, if any
    pub async fn find_by_token(
        &self,
        token: IdempotencyKey,
    ) -> Result<Option<PaymentRecord>, ServiceError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{SELECT_PAYMENT} WHERE token = $1"))
            .bind(*token.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.into_payment().map_err(ServiceError::Database))
            .transpose()
    }

    /// Fetches the payment attached to a trip, if any
    pub async fn payment_for_trip(
        &self,
        trip_id: TripId,
    ) -> Result<Option<PaymentRecord>, ServiceError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{SELECT_PAYMENT} WHERE trip_id = $1"))
            .bind(Uuid::from(trip_id))
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.into_payment().map_err(ServiceError::Database))
            .transpose()
    }

    /// Lists the payments made by an account, newest first
    pub async fn list_payments_for_account(
        &self,
        payer_id: AccountId,
    ) -> Result<Vec<PaymentRecord>, ServiceError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{SELECT_PAYMENT} WHERE payer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(Uuid::from(payer_id))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.into_payment().map_err(ServiceError::Database))
            .collect()
    }

    async fn lock_payment(
        &self,
        conn: &mut PgConnection,
        id: PaymentId,
    ) -> Result<PaymentRecord, ServiceError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "{SELECT_PAYMENT} WHERE id = $1 FOR UPDATE"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::not_found("payment", id))?;
        row.into_payment().map_err(ServiceError::Database)
    }
}
