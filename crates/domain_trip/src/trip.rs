//! Trip aggregate and lifecycle state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{AccountId, Money, MovementId, TripId};

use crate::error::TripError;

/// Trip status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Created,
    InProgress,
    Finalized,
    Cancelled,
}

impl TripStatus {
    /// Checks if a status transition is valid
    pub fn can_transition_to(&self, new_status: &TripStatus) -> bool {
        matches!(
            (self, new_status),
            (TripStatus::Created, TripStatus::InProgress)
                | (TripStatus::Created, TripStatus::Cancelled)
                | (TripStatus::InProgress, TripStatus::Finalized)
                | (TripStatus::InProgress, TripStatus::Cancelled)
        )
    }

    /// Open trips count against the one-open-trip-per-party rule
    pub fn is_open(&self) -> bool {
        matches!(self, TripStatus::Created | TripStatus::InProgress)
    }

    /// Finalized and cancelled trips never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Finalized | TripStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Created => "created",
            TripStatus::InProgress => "in_progress",
            TripStatus::Finalized => "finalized",
            TripStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(TripStatus::Created),
            "in_progress" => Some(TripStatus::InProgress),
            "finalized" => Some(TripStatus::Finalized),
            "cancelled" => Some(TripStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Computes the fare for a trip
///
/// `total = rate * distance`, rounded to cents at the multiplication. The
/// inputs must be strictly positive.
pub fn fare_total(distance_km: Decimal, rate_per_km: Money) -> Result<Money, TripError> {
    if distance_km <= Decimal::ZERO {
        return Err(TripError::InvalidDistance(distance_km));
    }
    if !rate_per_km.is_positive() {
        return Err(TripError::InvalidRate(rate_per_km.amount()));
    }
    Ok(rate_per_km.multiply(distance_km))
}

/// Outcome of a cancellation request
///
/// Cancelling an already-cancelled trip is a successful no-op, so callers
/// that retry a cancellation never double-reverse the fare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The trip was cancelled now; the fare movement must be reversed
    Cancelled { reverse: MovementId },
    /// The trip was already cancelled; nothing to do
    AlreadyCancelled,
}

/// A trip between a payer (passenger) and a payee (driver)
///
/// The fare is transferred when the trip is created and reversed if the
/// trip is cancelled. `movement_id` references that original transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub payer_id: AccountId,
    pub payee_id: AccountId,
    pub distance_km: Decimal,
    pub rate_per_km: Money,
    pub total: Money,
    pub status: TripStatus,
    pub movement_id: MovementId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Creates a new trip in `created` status
    ///
    /// `movement_id` is the fare transfer recorded by the ledger for this
    /// trip; creation and transfer commit together.
    ///
    /// # Errors
    ///
    /// Returns error if the parties coincide or distance/rate are not
    /// strictly positive
    pub fn create(
        payer_id: AccountId,
        payee_id: AccountId,
        distance_km: Decimal,
        rate_per_km: Money,
        movement_id: MovementId,
    ) -> Result<Self, TripError> {
        if payer_id == payee_id {
            return Err(TripError::SameParty);
        }
        let total = fare_total(distance_km, rate_per_km)?;
        let now = Utc::now();
        let trip = Self {
            id: TripId::new(),
            payer_id,
            payee_id,
            distance_km,
            rate_per_km,
            total,
            status: TripStatus::Created,
            movement_id,
            created_at: now,
            updated_at: now,
        };
        info!(trip_id = %trip.id, total = %total, "trip created");
        Ok(trip)
    }

    /// Marks the trip as underway
    pub fn start(&mut self) -> Result<(), TripError> {
        self.transition_to(TripStatus::InProgress)
    }

    /// Finalizes the trip
    ///
    /// Only an in-progress trip with a settled payment can finalize.
    ///
    /// # Errors
    ///
    /// - `PaymentNotSettled` if the payment is not paid
    /// - `InvalidStatusTransition` from any status other than `in_progress`
    pub fn finalize(&mut self, payment_settled: bool) -> Result<(), TripError> {
        if !payment_settled {
            return Err(TripError::PaymentNotSettled);
        }
        self.transition_to(TripStatus::Finalized)
    }

    /// Cancels the trip
    ///
    /// Idempotent: a second cancellation reports `AlreadyCancelled` and
    /// changes nothing. Finalized trips cannot be cancelled.
    pub fn cancel(&mut self) -> Result<CancelOutcome, TripError> {
        match self.status {
            TripStatus::Cancelled => Ok(CancelOutcome::AlreadyCancelled),
            TripStatus::Finalized => Err(TripError::AlreadyFinalized),
            _ => {
                self.transition_to(TripStatus::Cancelled)?;
                Ok(CancelOutcome::Cancelled {
                    reverse: self.movement_id,
                })
            }
        }
    }

    fn transition_to(&mut self, new_status: TripStatus) -> Result<(), TripError> {
        if !self.status.can_transition_to(&new_status) {
            return Err(TripError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: new_status.to_string(),
            });
        }
        info!(trip_id = %self.id, from = %self.status, to = %new_status, "trip status changed");
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }
}
