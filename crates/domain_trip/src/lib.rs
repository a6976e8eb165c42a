//! Trip Domain
//!
//! This crate implements the trip lifecycle:
//!
//! ```text
//! created -> in_progress -> finalized
//! created | in_progress -> cancelled
//! ```
//!
//! At most one trip per payer and per payee may be in `created` or
//! `in_progress` at any time; the storage layer enforces that exclusivity
//! under lock.

pub mod trip;
pub mod error;

pub use trip::{fare_total, CancelOutcome, Trip, TripStatus};
pub use error::TripError;
