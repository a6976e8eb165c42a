//! Core Kernel - Foundational types for the ride-payments system
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money with precise fixed-point arithmetic (2 decimal places, BRL)
//! - Strongly-typed identifiers and the idempotency key
//! - The shared error taxonomy

pub mod money;
pub mod identifiers;
pub mod error;

pub use money::{Money, MoneyError};
pub use identifiers::{AccountId, TripId, PaymentId, MovementId, IdempotencyKey};
pub use error::CoreError;
