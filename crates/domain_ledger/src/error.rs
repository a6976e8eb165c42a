//! Ledger domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::CoreError;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account already registered with the ledger
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    /// A blocked party cannot take part in transfers
    #[error("Account is blocked: {0}")]
    AccountBlocked(String),

    /// Transfer amounts must be strictly positive
    #[error("Transfer amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Payer and payee must be distinct
    #[error("Cannot transfer between an account and itself")]
    SameAccount,

    /// Payer balance below the transfer amount
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Movement not found
    #[error("Movement not found: {0}")]
    MovementNotFound(String),

    /// The payee no longer holds the amount the reversal must claw back.
    /// Hard condition: surfaced, never silently adjusted.
    #[error("Consistency error: payee balance {available} cannot cover reversal of {required}")]
    ReversalNotCovered {
        required: Decimal,
        available: Decimal,
    },
}

impl From<LedgerError> for CoreError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::AccountNotFound(id) => CoreError::NotFound(format!("account {}", id)),
            LedgerError::MovementNotFound(id) => CoreError::NotFound(format!("movement {}", id)),
            LedgerError::InsufficientFunds { required, available } => {
                CoreError::InsufficientFunds { required, available }
            }
            LedgerError::ReversalNotCovered { .. } => CoreError::Consistency(error.to_string()),
            LedgerError::AccountBlocked(_) | LedgerError::AccountAlreadyExists(_) => {
                CoreError::Conflict(error.to_string())
            }
            LedgerError::NonPositiveAmount(_) | LedgerError::SameAccount => {
                CoreError::Validation(error.to_string())
            }
        }
    }
}
