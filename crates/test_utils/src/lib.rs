//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! trip and payment test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for test data construction
//! - `database`: Database test helpers and container management
//! - `assertions`: Custom assertion helpers for domain types

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use fixtures::*;
