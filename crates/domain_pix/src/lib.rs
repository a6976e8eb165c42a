//! Instant-Payment Domain (PIX / BR Code)
//!
//! This crate produces the merchant-presented payment payload: a textual,
//! TLV-encoded, checksum-terminated string that the payer's application
//! decodes to initiate a real-time payment.

pub mod checksum;
pub mod payload;
pub mod error;

pub use checksum::Crc16;
pub use payload::{Merchant, PixPayload};
pub use error::PixError;
