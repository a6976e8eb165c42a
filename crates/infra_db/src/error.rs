//! Database and service error types
//!
//! `DatabaseError` classifies low-level SQLx failures by PostgreSQL error
//! code. `ServiceError` is what repositories return: either a domain
//! rejection or a storage failure.

use thiserror::Error;

use core_kernel::CoreError;
use domain_ledger::LedgerError;
use domain_payment::PaymentError;
use domain_trip::TripError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Lock wait aborted, deadlock broken or serialization failure;
    /// the whole transaction can be retried
    #[error("Transaction aborted, retry possible: {0}")]
    Retryable(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value does not map back to a domain type
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Pool exhaustion, no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if retrying the enclosing transaction may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, DatabaseError::Retryable(_) | DatabaseError::PoolExhausted)
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// Maps by PostgreSQL error code, see
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                        "23503" => {
                            DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                        }
                        "23514" => {
                            DatabaseError::ConstraintViolation(db_err.message().to_string())
                        }
                        "55P03" | "40P01" | "40001" => {
                            DatabaseError::Retryable(db_err.message().to_string())
                        }
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

/// The error type returned by repository operations
///
/// Domain rejections keep their taxonomy (validation, conflict,
/// insufficient funds, consistency) while storage failures stay separate
/// so callers can distinguish "the request is wrong" from "the database
/// had a problem".
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    /// Checks if this error indicates a missing entity
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::Domain(e) => e.is_not_found(),
            ServiceError::Database(e) => e.is_not_found(),
        }
    }

    /// Checks if retrying the operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Domain(_) => false,
            ServiceError::Database(e) => e.is_retryable(),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(error: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::from(error))
    }
}

impl From<LedgerError> for ServiceError {
    fn from(error: LedgerError) -> Self {
        ServiceError::Domain(error.into())
    }
}

impl From<TripError> for ServiceError {
    fn from(error: TripError) -> Self {
        ServiceError::Domain(error.into())
    }
}

impl From<PaymentError> for ServiceError {
    fn from(error: PaymentError) -> Self {
        ServiceError::Domain(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DatabaseError::Retryable("deadlock detected".into()).is_retryable());
        assert!(DatabaseError::PoolExhausted.is_retryable());
        assert!(!DatabaseError::DuplicateEntry("token".into()).is_retryable());
    }

    #[test]
    fn test_domain_errors_are_never_retryable() {
        let error = ServiceError::from(CoreError::conflict("trip already finalized"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_not_found_passthrough() {
        let error = ServiceError::Database(DatabaseError::not_found("Trip", "TRP-1"));
        assert!(error.is_not_found());
    }
}
