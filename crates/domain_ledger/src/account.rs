//! Account types
//!
//! Accounts are created by provisioning (outside the core) and never
//! deleted; only their status flips. Balances are mutated exclusively by
//! ledger operations.

use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, Money};

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Blocked,
}

impl AccountStatus {
    /// Stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Blocked => "blocked",
        }
    }

    /// Parses the stored string form
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(AccountStatus::Active),
            "blocked" => Some(AccountStatus::Blocked),
            _ => None,
        }
    }
}

/// A payer or payee account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// Account holder display name
    pub holder_name: String,
    /// Current balance, never negative
    pub balance: Money,
    /// Status
    pub status: AccountStatus,
}

impl Account {
    /// Creates an active account with an opening balance
    pub fn new(id: AccountId, holder_name: impl Into<String>, balance: Money) -> Self {
        Self {
            id,
            holder_name: holder_name.into(),
            balance,
            status: AccountStatus::Active,
        }
    }

    /// Returns true if the account can take part in transfers
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Blocks the account
    pub fn block(&mut self) {
        self.status = AccountStatus::Blocked;
    }

    /// Re-activates the account
    pub fn unblock(&mut self) {
        self.status = AccountStatus::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_account_is_active() {
        let account = Account::new(AccountId::new(), "Ana Souza", Money::new(dec!(100.00)));
        assert!(account.is_active());
        assert_eq!(account.balance.amount(), dec!(100.00));
    }

    #[test]
    fn test_status_string_roundtrip() {
        assert_eq!(AccountStatus::parse("active"), Some(AccountStatus::Active));
        assert_eq!(AccountStatus::parse("blocked"), Some(AccountStatus::Blocked));
        assert_eq!(AccountStatus::parse("closed"), None);
        assert_eq!(AccountStatus::Blocked.as_str(), "blocked");
    }

    #[test]
    fn test_block_unblock() {
        let mut account = Account::new(AccountId::new(), "Ana Souza", Money::zero());
        account.block();
        assert!(!account.is_active());
        account.unblock();
        assert!(account.is_active());
    }
}
