//! Strongly-typed identifiers for domain entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Ledger identifiers
define_id!(AccountId, "ACC");
define_id!(MovementId, "MOV");

// Trip and payment identifiers
define_id!(TripId, "TRP");
define_id!(PaymentId, "PAY");

/// A caller-supplied idempotency token
///
/// Externally-initiated payments must carry a client-chosen token in the
/// standard 36-character hyphenated textual form of a v4 UUID. Anything
/// else is rejected before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Length of the accepted textual form
    pub const TEXTUAL_LEN: usize = 36;

    /// Generates a fresh token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses and validates a caller-supplied token
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        if token.len() != Self::TEXTUAL_LEN {
            return Err(CoreError::validation(format!(
                "idempotency token must be the 36-character form of a v4 UUID, got {} characters",
                token.len()
            )));
        }
        let uuid = Uuid::parse_str(token)
            .map_err(|_| CoreError::validation("idempotency token is not a well-formed UUID"))?;
        if uuid.get_version_num() != 4 {
            return Err(CoreError::validation(format!(
                "idempotency token must be a v4 UUID, got version {}",
                uuid.get_version_num()
            )));
        }
        Ok(Self(uuid))
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// Reconstructs a key already validated at the boundary
impl From<Uuid> for IdempotencyKey {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for IdempotencyKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for IdempotencyKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_id_display() {
        let id = TripId::new();
        assert!(id.to_string().starts_with("TRP-"));
    }

    #[test]
    fn test_id_parsing_roundtrip() {
        let original = AccountId::new();
        let parsed: AccountId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let id = PaymentId::from(uuid);
        let back: Uuid = id.into();
        assert_eq!(uuid, back);
    }

    #[test]
    fn test_idempotency_key_accepts_v4() {
        let token = Uuid::new_v4().hyphenated().to_string();
        let key = IdempotencyKey::parse(&token).unwrap();
        assert_eq!(key.to_string(), token);
    }

    #[test]
    fn test_idempotency_key_rejects_wrong_version() {
        let token = Uuid::now_v7().hyphenated().to_string();
        assert!(IdempotencyKey::parse(&token).is_err());
    }

    #[test]
    fn test_idempotency_key_rejects_malformed() {
        assert!(IdempotencyKey::parse("not-a-uuid").is_err());
        // Simple form (no hyphens) is not the accepted 36-character shape.
        let simple = Uuid::new_v4().simple().to_string();
        assert!(IdempotencyKey::parse(&simple).is_err());
        assert!(IdempotencyKey::parse("").is_err());
    }
}
