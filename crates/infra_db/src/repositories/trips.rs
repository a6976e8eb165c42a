//! Trips repository implementation
//!
//! Requesting a trip charges the fare, cancelling it reverses the charge;
//! each runs as one transaction over the trip row, both account rows and
//! the movement trail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use core_kernel::{AccountId, CoreError, Money, MovementId, TripId};
use domain_ledger::LedgerMovement;
use domain_trip::{fare_total, CancelOutcome, Trip, TripStatus};

use crate::error::{DatabaseError, ServiceError};
use crate::repositories::ledger::{apply_movement, find_movement_in_tx, lock_account_pair};
use crate::repositories::payments::cancel_trip_payment_in_tx;

#[derive(Debug, FromRow)]
pub(crate) struct TripRow {
    pub id: Uuid,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub distance_km: Decimal,
    pub rate_per_km: Decimal,
    pub total: Decimal,
    pub status: String,
    pub movement_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripRow {
    pub(crate) fn into_trip(self) -> Result<Trip, DatabaseError> {
        let status = TripStatus::parse(&self.status).ok_or_else(|| {
            DatabaseError::CorruptRow(format!("unknown trip status '{}'", self.status))
        })?;
        Ok(Trip {
            id: TripId::from(self.id),
            payer_id: AccountId::from(self.payer_id),
            payee_id: AccountId::from(self.payee_id),
            distance_km: self.distance_km,
            rate_per_km: Money::new(self.rate_per_km),
            total: Money::new(self.total),
            status,
            movement_id: MovementId::from(self.movement_id),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_TRIP: &str = r#"
    SELECT id, payer_id, payee_id, distance_km, rate_per_km, total,
           status, movement_id, created_at, updated_at
    FROM trips WHERE id = $1
"#;

const SELECT_TRIP_FOR_UPDATE: &str = r#"
    SELECT id, payer_id, payee_id, distance_km, rate_per_km, total,
           status, movement_id, created_at, updated_at
    FROM trips WHERE id = $1 FOR UPDATE
"#;

/// Locks a trip row inside an open transaction
pub(crate) async fn lock_trip(
    conn: &mut PgConnection,
    id: TripId,
) -> Result<Trip, ServiceError> {
    let row = sqlx::query_as::<_, TripRow>(SELECT_TRIP_FOR_UPDATE)
        .bind(Uuid::from(id))
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::not_found("trip", id))?;
    row.into_trip().map_err(ServiceError::Database)
}

/// Persists a trip status change decided by the domain aggregate
pub(crate) async fn store_trip_status(
    conn: &mut PgConnection,
    trip: &Trip,
) -> Result<(), ServiceError> {
    sqlx::query("UPDATE trips SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(trip.status.as_str())
        .bind(trip.updated_at)
        .bind(Uuid::from(trip.id))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Reverses the fare movement of a trip
///
/// The caller holds the trip lock and has already checked the trip is not
/// cancelled, which makes the reversal happen at most once. The payee must
/// still hold the fare; a shortfall is a consistency failure that aborts
/// the transaction.
pub(crate) async fn reverse_fare(
    conn: &mut PgConnection,
    trip: &Trip,
) -> Result<MovementId, ServiceError> {
    let original = find_movement_in_tx(&mut *conn, trip.movement_id).await?;
    let (_, payee) = lock_account_pair(&mut *conn, original.payer_id, original.payee_id).await?;

    if payee.balance < original.amount {
        warn!(
            trip_id = %trip.id,
            required = %original.amount,
            available = %payee.balance,
            "fare reversal not covered by payee balance"
        );
        return Err(CoreError::consistency(format!(
            "reversal of {} requires {} but payee holds {}",
            original.id,
            original.amount,
            payee.balance
        ))
        .into());
    }

    let reversal = LedgerMovement::reversal_of(&original);
    let reversal_id = reversal.id;
    apply_movement(&mut *conn, &reversal).await?;
    info!(trip_id = %trip.id, %reversal_id, "fare reversed");
    Ok(reversal_id)
}

/// Repository for the trip lifecycle
#[derive(Debug, Clone)]
pub struct TripsRepository {
    pool: PgPool,
}

impl TripsRepository {
    /// Creates a new TripsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Requests a trip, charging the fare up front
    ///
    /// In one transaction: locks both accounts in deterministic order,
    /// checks that neither party already has an open trip, verifies the
    /// payer can cover `rate * distance`, records the transfer and inserts
    /// the trip in `created` status.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for non-positive distance or rate, or equal parties
    /// - `ConflictError` if either party already has an open trip or is blocked
    /// - `InsufficientFundsError` if the payer cannot cover the fare
    #[instrument(skip(self))]
    pub async fn request_trip(
        &self,
        payer_id: AccountId,
        payee_id: AccountId,
        distance_km: Decimal,
        rate_per_km: Money,
    ) -> Result<Trip, ServiceError> {
        if payer_id == payee_id {
            return Err(CoreError::validation("payer and payee must be different accounts").into());
        }
        let total = fare_total(distance_km, rate_per_km).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let (payer, payee) = lock_account_pair(&mut tx, payer_id, payee_id).await?;
        if !payer.is_active() {
            return Err(CoreError::conflict(format!("account {} is blocked", payer_id)).into());
        }
        if !payee.is_active() {
            return Err(CoreError::conflict(format!("account {} is blocked", payee_id)).into());
        }

        // With both account rows locked, concurrent requests for the same
        // parties serialize here, so this check cannot race.
        let has_open: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM trips
                WHERE (payer_id = $1 OR payee_id = $1 OR payer_id = $2 OR payee_id = $2)
                  AND status IN ('created', 'in_progress')
            )
            "#,
        )
        .bind(Uuid::from(payer_id))
        .bind(Uuid::from(payee_id))
        .fetch_one(&mut *tx)
        .await?;
        if has_open {
            return Err(CoreError::conflict("party already has an open trip").into());
        }

        if payer.balance < total {
            return Err(CoreError::InsufficientFunds {
                required: total.amount(),
                available: payer.balance.amount(),
            }
            .into());
        }

        let mut movement = LedgerMovement::transfer(payer_id, payee_id, total, None);
        let trip = Trip::create(payer_id, payee_id, distance_km, rate_per_km, movement.id)
            .map_err(CoreError::from)?;
        movement.trip_id = Some(trip.id);
        apply_movement(&mut tx, &movement).await?;

        sqlx::query(
            r#"
            INSERT INTO trips (
                id, payer_id, payee_id, distance_km, rate_per_km, total,
                status, movement_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::from(trip.id))
        .bind(Uuid::from(trip.payer_id))
        .bind(Uuid::from(trip.payee_id))
        .bind(trip.distance_km)
        .bind(trip.rate_per_km.amount())
        .bind(trip.total.amount())
        .bind(trip.status.as_str())
        .bind(Uuid::from(trip.movement_id))
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(trip_id = %trip.id, total = %trip.total, "trip requested");
        Ok(trip)
    }

    /// Marks a trip as underway
    #[instrument(skip(self))]
    pub async fn start_trip(&self, id: TripId) -> Result<Trip, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut trip = lock_trip(&mut tx, id).await?;
        trip.start().map_err(CoreError::from)?;
        store_trip_status(&mut tx, &trip).await?;
        tx.commit().await?;
        Ok(trip)
    }

    /// Finalizes a trip whose payment has settled
    ///
    /// # Errors
    ///
    /// `ConflictError` if the trip is not in progress or its payment is
    /// not paid
    #[instrument(skip(self))]
    pub async fn finalize_trip(&self, id: TripId) -> Result<Trip, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut trip = lock_trip(&mut tx, id).await?;

        let payment_settled: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE trip_id = $1 AND status = 'paid')",
        )
        .bind(Uuid::from(id))
        .fetch_one(&mut *tx)
        .await?;

        trip.finalize(payment_settled).map_err(CoreError::from)?;
        store_trip_status(&mut tx, &trip).await?;
        tx.commit().await?;
        info!(trip_id = %id, "trip finalized");
        Ok(trip)
    }

    /// Cancels a trip, reversing the fare
    ///
    /// Idempotent: cancelling an already-cancelled trip succeeds without
    /// touching balances. The trip row lock plus the not-yet-cancelled
    /// status guard guarantee the reversal is recorded exactly once even
    /// under concurrent cancel requests.
    ///
    /// # Errors
    ///
    /// - `ConflictError` if the trip is finalized
    /// - `ConsistencyError` if the payee no longer holds the fare
    #[instrument(skip(self))]
    pub async fn cancel_trip(&self, id: TripId) -> Result<Trip, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut trip = lock_trip(&mut tx, id).await?;

        match trip.cancel().map_err(CoreError::from)? {
            CancelOutcome::AlreadyCancelled => {
                tx.rollback().await?;
                return Ok(trip);
            }
            CancelOutcome::Cancelled { .. } => {
                reverse_fare(&mut tx, &trip).await?;
                cancel_trip_payment_in_tx(&mut tx, trip.id).await?;
                store_trip_status(&mut tx, &trip).await?;
            }
        }

        tx.commit().await?;
        info!(trip_id = %id, "trip cancelled");
        Ok(trip)
    }

    /// Fetches a trip by id
    pub async fn find_trip(&self, id: TripId) -> Result<Trip, ServiceError> {
        let row = sqlx::query_as::<_, TripRow>(SELECT_TRIP)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("trip", id))?;
        row.into_trip().map_err(ServiceError::Database)
    }

    /// Lists the trips a party took part in, newest first
    pub async fn list_trips_for_account(&self, account_id: AccountId) -> Result<Vec<Trip>, ServiceError> {
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, payer_id, payee_id, distance_km, rate_per_km, total,
                   status, movement_id, created_at, updated_at
            FROM trips
            WHERE payer_id = $1 OR payee_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(Uuid::from(account_id))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.into_trip().map_err(ServiceError::Database))
            .collect()
    }
}
