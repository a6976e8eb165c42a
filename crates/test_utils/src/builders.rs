//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the fields they care about.

use fake::faker::name::en::Name;
use fake::Fake;

use core_kernel::{AccountId, Money};
use domain_ledger::{Account, AccountStatus};

use crate::fixtures::MoneyFixtures;

/// Builder for test accounts
pub struct TestAccountBuilder {
    id: AccountId,
    holder_name: String,
    balance: Money,
    status: AccountStatus,
}

impl Default for TestAccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAccountBuilder {
    /// Creates a new builder with a random holder and the standard
    /// passenger balance
    pub fn new() -> Self {
        Self {
            id: AccountId::new(),
            holder_name: Name().fake(),
            balance: MoneyFixtures::passenger_balance(),
            status: AccountStatus::Active,
        }
    }

    /// Sets the account ID
    pub fn with_id(mut self, id: AccountId) -> Self {
        self.id = id;
        self
    }

    /// Sets the holder name
    pub fn with_holder_name(mut self, name: impl Into<String>) -> Self {
        self.holder_name = name.into();
        self
    }

    /// Sets the opening balance
    pub fn with_balance(mut self, balance: Money) -> Self {
        self.balance = balance;
        self
    }

    /// Marks the account as blocked
    pub fn blocked(mut self) -> Self {
        self.status = AccountStatus::Blocked;
        self
    }

    /// Builds the account
    pub fn build(self) -> Account {
        let mut account = Account::new(self.id, self.holder_name, self.balance);
        if self.status == AccountStatus::Blocked {
            account.block();
        }
        account
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_defaults() {
        let account = TestAccountBuilder::new().build();
        assert!(account.is_active());
        assert_eq!(account.balance.amount(), dec!(100.00));
        assert!(!account.holder_name.is_empty());
    }

    #[test]
    fn test_builder_overrides() {
        let account = TestAccountBuilder::new()
            .with_holder_name("Carlos Pereira")
            .with_balance(Money::new(dec!(12.34)))
            .blocked()
            .build();
        assert!(!account.is_active());
        assert_eq!(account.holder_name, "Carlos Pereira");
        assert_eq!(account.balance.amount(), dec!(12.34));
    }
}
