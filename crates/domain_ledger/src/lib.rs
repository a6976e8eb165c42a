//! Account Ledger Domain
//!
//! This crate models the money side of the system: payer and payee accounts,
//! the append-only movement trail, and the transfer/reversal rules. The
//! in-memory [`AccountLedger`] expresses the rules; the storage layer runs
//! the same rules under row-level locks.

pub mod account;
pub mod movement;
pub mod ledger;
pub mod error;

pub use account::{Account, AccountStatus};
pub use movement::{LedgerMovement, MovementKind};
pub use ledger::{lock_order, AccountLedger};
pub use error::LedgerError;
