//! Repository implementations for domain aggregates
//!
//! Each repository encapsulates the SQL for one aggregate and maps between
//! database rows and domain types. Operations that move money run inside a
//! single transaction with `FOR UPDATE` row locks, taken in the
//! deterministic order given by `domain_ledger::lock_order`.

pub mod idempotency;
pub mod ledger;
pub mod payments;
pub mod trips;

pub use idempotency::{IdempotencyRecord, IdempotencyRepository};
pub use ledger::LedgerRepository;
pub use payments::PaymentsRepository;
pub use trips::TripsRepository;
