//! Trip domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::CoreError;

/// Errors that can occur in the trip domain
#[derive(Debug, Error)]
pub enum TripError {
    /// Distance must be strictly positive
    #[error("Distance must be positive, got {0}")]
    InvalidDistance(Decimal),

    /// Unit rate must be strictly positive
    #[error("Rate must be positive, got {0}")]
    InvalidRate(Decimal),

    /// Payer and payee must be distinct accounts
    #[error("Payer and payee must be different accounts")]
    SameParty,

    /// Transition not in the legal-transition table
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// A finalized trip can never change again
    #[error("Trip is finalized and cannot be cancelled")]
    AlreadyFinalized,

    /// Finalization requires a paid payment record
    #[error("Trip cannot be finalized without a paid payment")]
    PaymentNotSettled,
}

impl From<TripError> for CoreError {
    fn from(error: TripError) -> Self {
        match error {
            TripError::InvalidDistance(_) | TripError::InvalidRate(_) | TripError::SameParty => {
                CoreError::Validation(error.to_string())
            }
            TripError::InvalidStatusTransition { .. }
            | TripError::AlreadyFinalized
            | TripError::PaymentNotSettled => CoreError::Conflict(error.to_string()),
        }
    }
}
