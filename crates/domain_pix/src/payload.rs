//! BR Code payload encoding
//!
//! Builds the merchant-presented TLV payload per the BACEN (EMV-Co) layout:
//! each field is a two-digit tag, a two-digit zero-padded length and the
//! value, concatenated in a fixed order and terminated by the `6304`
//! checksum field.

use serde::{Deserialize, Serialize};

use core_kernel::Money;

use crate::checksum::Crc16;
use crate::error::PixError;

// Top-level field tags, in emission order.
const TAG_PAYLOAD_FORMAT: &str = "00";
const TAG_MERCHANT_ACCOUNT_INFO: &str = "26";
const TAG_MERCHANT_CATEGORY_CODE: &str = "52";
const TAG_CURRENCY: &str = "53";
const TAG_AMOUNT: &str = "54";
const TAG_COUNTRY: &str = "58";
const TAG_MERCHANT_NAME: &str = "59";
const TAG_MERCHANT_CITY: &str = "60";
const TAG_ADDITIONAL_DATA: &str = "62";
const TAG_CRC: &str = "63";

// Sub-tags of the merchant-account-info and additional-data templates.
const SUB_TAG_GUI: &str = "00";
const SUB_TAG_KEY: &str = "01";
const SUB_TAG_REFERENCE: &str = "05";

const PAYLOAD_FORMAT_INDICATOR: &str = "01";
const PIX_GUI: &str = "BR.GOV.BCB.PIX";
const MERCHANT_CATEGORY_UNSPECIFIED: &str = "0000";
const CURRENCY_BRL_NUMERIC: &str = "986";
const COUNTRY_BR: &str = "BR";

/// Maximum length of the merchant display name field
pub const MERCHANT_NAME_MAX: usize = 25;
/// Maximum length of the merchant city field
pub const MERCHANT_CITY_MAX: usize = 15;

/// The receiving side of an instant payment
///
/// Deserializable so the boundary layer can load the platform merchant
/// from configuration. Name and city are truncated to the field limits at
/// encoding time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    /// PIX key of the payee (e-mail, phone, document or random key)
    pub key: String,
    /// Display name, at most 25 characters end up in the payload
    pub name: String,
    /// City, at most 15 characters end up in the payload
    pub city: String,
}

impl Merchant {
    /// Creates a merchant descriptor
    pub fn new(key: impl Into<String>, name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            city: city.into(),
        }
    }
}

/// A merchant-presented instant-payment payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixPayload {
    merchant: Merchant,
    amount: Money,
    reference: String,
}

impl PixPayload {
    /// Validates the inputs and prepares a payload for encoding
    ///
    /// A non-positive amount is a caller error rejected before any
    /// encoding happens.
    pub fn new(
        merchant: Merchant,
        amount: Money,
        reference: impl Into<String>,
    ) -> Result<Self, PixError> {
        if !amount.is_positive() {
            return Err(PixError::InvalidAmount(amount.amount()));
        }
        if merchant.key.trim().is_empty() {
            return Err(PixError::EmptyKey);
        }
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(PixError::EmptyReference);
        }
        Ok(Self {
            merchant,
            amount,
            reference,
        })
    }

    /// Encodes the payload string, checksum included
    ///
    /// Deterministic and pure: the same inputs always produce the same
    /// string, independent of call order or prior state.
    pub fn encode(&self) -> String {
        let account_info = format!(
            "{}{}{}",
            emv(SUB_TAG_GUI, PIX_GUI),
            emv(SUB_TAG_KEY, &self.merchant.key),
            emv(SUB_TAG_REFERENCE, &self.reference),
        );

        let mut payload = String::new();
        payload.push_str(&emv(TAG_PAYLOAD_FORMAT, PAYLOAD_FORMAT_INDICATOR));
        payload.push_str(&emv(TAG_MERCHANT_ACCOUNT_INFO, &account_info));
        payload.push_str(&emv(TAG_MERCHANT_CATEGORY_CODE, MERCHANT_CATEGORY_UNSPECIFIED));
        payload.push_str(&emv(TAG_CURRENCY, CURRENCY_BRL_NUMERIC));
        payload.push_str(&emv(TAG_AMOUNT, &self.amount.to_wire()));
        payload.push_str(&emv(TAG_COUNTRY, COUNTRY_BR));
        payload.push_str(&emv(TAG_MERCHANT_NAME, &truncate(&self.merchant.name, MERCHANT_NAME_MAX)));
        payload.push_str(&emv(TAG_MERCHANT_CITY, &truncate(&self.merchant.city, MERCHANT_CITY_MAX)));
        payload.push_str(&emv(
            TAG_ADDITIONAL_DATA,
            &emv(SUB_TAG_REFERENCE, &self.reference),
        ));

        // The checksum covers the whole payload including its own tag and
        // length placeholder.
        payload.push_str(TAG_CRC);
        payload.push_str("04");
        let crc = Crc16::CCITT_FALSE.hex(payload.as_bytes());
        payload.push_str(&crc);
        payload
    }
}

/// Encodes one tag-length-value field
///
/// Lengths count characters, not UTF-8 bytes; an accented merchant name
/// must encode the same length a reader counting characters expects.
fn emv(tag: &str, value: &str) -> String {
    format!("{}{:02}{}", tag, value.chars().count(), value)
}

/// Truncates to at most `max` characters
fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
