//! Ledger movements
//!
//! A movement is one atomic, directional balance adjustment between two
//! accounts, always paired with its originating trip. Movements are the
//! audit trail of the ledger: append-only, never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, Money, MovementId, TripId};

/// Kind of movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Debit payer, credit payee
    Transfer,
    /// Compensating entry: credit payer, debit payee
    Reversal,
}

impl MovementKind {
    /// Stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Transfer => "transfer",
            MovementKind::Reversal => "reversal",
        }
    }

    /// Parses the stored string form
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "transfer" => Some(MovementKind::Transfer),
            "reversal" => Some(MovementKind::Reversal),
            _ => None,
        }
    }
}

/// One atomic balance adjustment between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMovement {
    /// Unique identifier
    pub id: MovementId,
    /// Account debited by the original transfer
    pub payer_id: AccountId,
    /// Account credited by the original transfer
    pub payee_id: AccountId,
    /// Amount moved, strictly positive
    pub amount: Money,
    /// Transfer or reversal
    pub kind: MovementKind,
    /// Originating trip, when the movement belongs to one
    pub trip_id: Option<TripId>,
    /// The movement this one compensates, for reversals
    pub reverses: Option<MovementId>,
    /// When the movement was recorded
    pub created_at: DateTime<Utc>,
}

impl LedgerMovement {
    /// Records a transfer movement
    pub fn transfer(payer_id: AccountId, payee_id: AccountId, amount: Money, trip_id: Option<TripId>) -> Self {
        Self {
            id: MovementId::new_v7(),
            payer_id,
            payee_id,
            amount,
            kind: MovementKind::Transfer,
            trip_id,
            reverses: None,
            created_at: Utc::now(),
        }
    }

    /// Records the compensating movement for `original`
    pub fn reversal_of(original: &LedgerMovement) -> Self {
        Self {
            id: MovementId::new_v7(),
            payer_id: original.payer_id,
            payee_id: original.payee_id,
            amount: original.amount,
            kind: MovementKind::Reversal,
            trip_id: original.trip_id,
            reverses: Some(original.id),
            created_at: Utc::now(),
        }
    }
}
