//! PIX domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::CoreError;

/// Errors that can occur while building a payment payload
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixError {
    /// Transaction amount must be strictly positive
    #[error("Invalid amount: {0} is not positive")]
    InvalidAmount(Decimal),

    /// The receiving key is missing
    #[error("Payee key must not be empty")]
    EmptyKey,

    /// The transaction reference is missing
    #[error("Transaction reference must not be empty")]
    EmptyReference,
}

impl From<PixError> for CoreError {
    fn from(error: PixError) -> Self {
        CoreError::Validation(error.to_string())
    }
}
