//! Core error types used across the system
//!
//! Every core operation runs inside one transaction; any of these errors
//! aborts and rolls back the whole operation. The most specific kind is
//! returned to the caller - a `Consistency` failure is never downgraded.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::MoneyError;

/// Core error taxonomy
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or missing input, rejected before touching storage
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced account, trip or payment is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Illegal state transition, blocked party, exclusivity or uniqueness
    /// violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payer balance below the transfer amount
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// A reversal cannot be satisfied; surfaced as a hard condition, never
    /// silently adjusted
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// A collaborator returned data that fails the required shape
    #[error("External format error: {0}")]
    ExternalFormat(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound(format!("{} {}", entity, id))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        CoreError::Consistency(message.into())
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }

    /// Returns true for errors the caller caused and may correct
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_)
                | CoreError::NotFound(_)
                | CoreError::Conflict(_)
                | CoreError::InsufficientFunds { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_funds_message() {
        let error = CoreError::InsufficientFunds {
            required: dec!(50.00),
            available: dec!(10.00),
        };
        let text = error.to_string();
        assert!(text.contains("50.00"));
        assert!(text.contains("10.00"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(CoreError::validation("bad input").is_client_error());
        assert!(CoreError::conflict("already cancelled").is_client_error());
        assert!(!CoreError::consistency("payee cannot cover reversal").is_client_error());
    }
}
