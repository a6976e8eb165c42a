//! Custom Test Assertions
//!
//! Assertion helpers for domain types and service errors that give more
//! meaningful messages than plain `assert!`.

use rust_decimal::Decimal;

use core_kernel::{CoreError, Money};
use infra_db::ServiceError;

/// Asserts that a Money value equals the expected decimal amount
pub fn assert_amount(actual: Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Expected amount {}, got {}",
        expected,
        actual.amount()
    );
}

/// Asserts that the error is a validation rejection
pub fn assert_validation_error(error: &ServiceError) {
    assert!(
        matches!(error, ServiceError::Domain(CoreError::Validation(_))),
        "Expected validation error, got {error:?}"
    );
}

/// Asserts that the error is a conflict
pub fn assert_conflict_error(error: &ServiceError) {
    assert!(
        matches!(error, ServiceError::Domain(CoreError::Conflict(_))),
        "Expected conflict error, got {error:?}"
    );
}

/// Asserts that the error reports missing funds
pub fn assert_insufficient_funds(error: &ServiceError) {
    assert!(
        matches!(error, ServiceError::Domain(CoreError::InsufficientFunds { .. })),
        "Expected insufficient funds error, got {error:?}"
    );
}

/// Asserts that the error is a consistency failure
pub fn assert_consistency_error(error: &ServiceError) {
    assert!(
        matches!(error, ServiceError::Domain(CoreError::Consistency(_))),
        "Expected consistency error, got {error:?}"
    );
}

/// Asserts that the error reports a missing entity
pub fn assert_not_found(error: &ServiceError) {
    assert!(error.is_not_found(), "Expected not found, got {error:?}");
}
