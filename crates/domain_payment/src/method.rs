//! Payment methods

use serde::{Deserialize, Serialize};

/// Supported payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    Debit,
    Credit,
    Boleto,
}

impl PaymentMethod {
    /// Whether the method settles at creation
    ///
    /// Pix and debit confirm immediately; credit and boleto wait for an
    /// external settlement.
    pub fn settles_synchronously(&self) -> bool {
        matches!(self, PaymentMethod::Pix | PaymentMethod::Debit)
    }

    /// Whether the method may split the amount in installments
    pub fn supports_installments(&self) -> bool {
        matches!(self, PaymentMethod::Credit | PaymentMethod::Boleto)
    }

    /// Whether the method carries a pix copy-and-paste payload
    pub fn has_qr_payload(&self) -> bool {
        matches!(self, PaymentMethod::Pix)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Boleto => "boleto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pix" => Some(PaymentMethod::Pix),
            "debit" => Some(PaymentMethod::Debit),
            "credit" => Some(PaymentMethod::Credit),
            "boleto" => Some(PaymentMethod::Boleto),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
