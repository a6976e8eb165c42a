//! Payment domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::CoreError;

/// Errors that can occur in the payment domain
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Amount must be strictly positive
    #[error("Payment amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Installment count outside 1..=12
    #[error("Installments must be between 1 and 12, got {0}")]
    InvalidInstallments(u32),

    /// Only deferred methods support multiple installments
    #[error("Payment method {0} does not support installments")]
    InstallmentsNotSupported(String),

    /// Transition not in the legal-transition table
    #[error("Invalid payment status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },
}

impl From<PaymentError> for CoreError {
    fn from(error: PaymentError) -> Self {
        match error {
            PaymentError::NonPositiveAmount(_)
            | PaymentError::InvalidInstallments(_)
            | PaymentError::InstallmentsNotSupported(_) => CoreError::Validation(error.to_string()),
            PaymentError::InvalidStatusTransition { .. } => CoreError::Conflict(error.to_string()),
        }
    }
}
