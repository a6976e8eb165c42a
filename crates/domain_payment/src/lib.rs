//! Payment Domain
//!
//! This crate implements payment records and their settlement lifecycle:
//!
//! ```text
//! pending -> paid -> refunded
//! pending -> cancelled
//! ```
//!
//! Synchronous methods (pix, debit) settle at creation and start in
//! `paid`. Deferred methods (credit, boleto) start in `pending` and may
//! carry up to 12 installments. Externally initiated instant payments
//! stay `pending` until the payer settles the presented payload.

pub mod error;
pub mod method;
pub mod payment;

pub use error::PaymentError;
pub use method::PaymentMethod;
pub use payment::{PaymentCancelOutcome, PaymentRecord, PaymentStatus, MAX_INSTALLMENTS};
