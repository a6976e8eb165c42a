//! In-memory account ledger
//!
//! The ledger holds payer/payee balances and performs atomic transfer and
//! reversal operations. Every movement is recorded in an append-only trail.
//!
//! # Invariants
//!
//! - Balances are never negative
//! - Every transfer debits and credits the same strictly positive amount
//! - Movements are never mutated, only compensated by reversals
//!
//! The ledger moves money unconditionally when called; calling it exactly
//! once per lifecycle event is the owning lifecycle's status guard.

use std::collections::HashMap;

use tracing::{error, info};

use core_kernel::{AccountId, Money, MovementId, TripId};

use crate::account::Account;
use crate::error::LedgerError;
use crate::movement::{LedgerMovement, MovementKind};

/// Orders an account pair deterministically, lower identity first
///
/// Both transfer and reversal must lock the two accounts in the same order
/// to prevent circular waits between concurrent opposite-direction
/// operations. The storage layer uses this same ordering for its
/// `FOR UPDATE` locks.
pub fn lock_order(a: AccountId, b: AccountId) -> (AccountId, AccountId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The account ledger
#[derive(Debug, Default)]
pub struct AccountLedger {
    accounts: HashMap<AccountId, Account>,
    movements: Vec<LedgerMovement>,
}

impl AccountLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account
    ///
    /// # Errors
    ///
    /// Returns error if the account is already registered
    pub fn add_account(&mut self, account: Account) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&account.id) {
            return Err(LedgerError::AccountAlreadyExists(account.id.to_string()));
        }
        self.accounts.insert(account.id, account);
        Ok(())
    }

    /// Gets an account by id
    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Gets the current balance of an account
    pub fn balance(&self, id: &AccountId) -> Option<Money> {
        self.accounts.get(id).map(|a| a.balance)
    }

    /// Gets a recorded movement by id
    pub fn movement(&self, id: &MovementId) -> Option<&LedgerMovement> {
        self.movements.iter().find(|m| &m.id == id)
    }

    /// The append-only movement trail
    pub fn movements(&self) -> &[LedgerMovement] {
        &self.movements
    }

    /// Moves `amount` from payer to payee
    ///
    /// Verifies both parties are active and the payer can cover the amount,
    /// then debits the payer, credits the payee and records the movement.
    /// All-or-nothing: validation happens before any balance changes.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` if the payer balance is below `amount`
    /// - `AccountBlocked` if either party is blocked
    /// - `AccountNotFound` / `NonPositiveAmount` / `SameAccount`
    pub fn transfer(
        &mut self,
        payer_id: AccountId,
        payee_id: AccountId,
        amount: Money,
        trip_id: Option<TripId>,
    ) -> Result<MovementId, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount.amount()));
        }
        if payer_id == payee_id {
            return Err(LedgerError::SameAccount);
        }

        let payer = self
            .accounts
            .get(&payer_id)
            .ok_or_else(|| LedgerError::AccountNotFound(payer_id.to_string()))?;
        let payee = self
            .accounts
            .get(&payee_id)
            .ok_or_else(|| LedgerError::AccountNotFound(payee_id.to_string()))?;

        if !payer.is_active() {
            return Err(LedgerError::AccountBlocked(payer_id.to_string()));
        }
        if !payee.is_active() {
            return Err(LedgerError::AccountBlocked(payee_id.to_string()));
        }
        if payer.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount.amount(),
                available: payer.balance.amount(),
            });
        }

        let movement = LedgerMovement::transfer(payer_id, payee_id, amount, trip_id);
        let movement_id = movement.id;

        let payer = self.accounts.get_mut(&payer_id).expect("checked above");
        payer.balance = payer
            .balance
            .checked_sub(&amount)
            .expect("balance checked above");
        let payee = self.accounts.get_mut(&payee_id).expect("checked above");
        payee.balance = payee.balance.add_rounded(&amount);

        self.movements.push(movement);
        info!(%movement_id, %payer_id, %payee_id, amount = %amount, "transfer recorded");
        Ok(movement_id)
    }

    /// Reverses a previously recorded transfer
    ///
    /// Credits the original payer back and debits the original payee, as a
    /// new compensating movement. The payee must currently hold at least
    /// the original amount; failing that guard is a consistency error,
    /// logged and surfaced, never auto-corrected.
    pub fn reverse(&mut self, movement_id: &MovementId) -> Result<MovementId, LedgerError> {
        let original = self
            .movements
            .iter()
            .find(|m| &m.id == movement_id)
            .ok_or_else(|| LedgerError::MovementNotFound(movement_id.to_string()))?
            .clone();

        if original.kind == MovementKind::Reversal {
            return Err(LedgerError::MovementNotFound(format!(
                "{} is itself a reversal",
                movement_id
            )));
        }

        let payee = self
            .accounts
            .get(&original.payee_id)
            .ok_or_else(|| LedgerError::AccountNotFound(original.payee_id.to_string()))?;

        if payee.balance < original.amount {
            let failure = LedgerError::ReversalNotCovered {
                required: original.amount.amount(),
                available: payee.balance.amount(),
            };
            error!(movement = %movement_id, %failure, "reversal cannot be satisfied");
            return Err(failure);
        }

        let reversal = LedgerMovement::reversal_of(&original);
        let reversal_id = reversal.id;

        let payee = self
            .accounts
            .get_mut(&original.payee_id)
            .expect("checked above");
        payee.balance = payee
            .balance
            .checked_sub(&original.amount)
            .expect("balance checked above");
        let payer = self
            .accounts
            .get_mut(&original.payer_id)
            .expect("payer existed when the transfer was recorded");
        payer.balance = payer.balance.add_rounded(&original.amount);

        self.movements.push(reversal);
        info!(%reversal_id, reverses = %movement_id, "reversal recorded");
        Ok(reversal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn funded_ledger() -> (AccountLedger, AccountId, AccountId) {
        let mut ledger = AccountLedger::new();
        let payer = AccountId::new();
        let payee = AccountId::new();
        ledger
            .add_account(Account::new(payer, "Passenger", Money::new(dec!(100.00))))
            .unwrap();
        ledger
            .add_account(Account::new(payee, "Driver", Money::new(dec!(20.00))))
            .unwrap();
        (ledger, payer, payee)
    }

    #[test]
    fn test_transfer_moves_exact_amount() {
        let (mut ledger, payer, payee) = funded_ledger();

        ledger
            .transfer(payer, payee, Money::new(dec!(50.00)), None)
            .unwrap();

        assert_eq!(ledger.balance(&payer).unwrap().amount(), dec!(50.00));
        assert_eq!(ledger.balance(&payee).unwrap().amount(), dec!(70.00));
    }

    #[test]
    fn test_transfer_insufficient_funds_changes_nothing() {
        let (mut ledger, payer, payee) = funded_ledger();

        let result = ledger.transfer(payer, payee, Money::new(dec!(100.01)), None);
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));

        assert_eq!(ledger.balance(&payer).unwrap().amount(), dec!(100.00));
        assert_eq!(ledger.balance(&payee).unwrap().amount(), dec!(20.00));
        assert!(ledger.movements().is_empty());
    }

    #[test]
    fn test_transfer_blocked_party_rejected() {
        let (mut ledger, payer, payee) = funded_ledger();
        ledger.accounts.get_mut(&payee).unwrap().block();

        let result = ledger.transfer(payer, payee, Money::new(dec!(10.00)), None);
        assert!(matches!(result, Err(LedgerError::AccountBlocked(_))));
    }

    #[test]
    fn test_transfer_rejects_non_positive_and_self() {
        let (mut ledger, payer, payee) = funded_ledger();

        assert!(matches!(
            ledger.transfer(payer, payee, Money::zero(), None),
            Err(LedgerError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            ledger.transfer(payer, payer, Money::new(dec!(1.00)), None),
            Err(LedgerError::SameAccount)
        ));
    }

    #[test]
    fn test_reverse_restores_balances() {
        let (mut ledger, payer, payee) = funded_ledger();
        let movement = ledger
            .transfer(payer, payee, Money::new(dec!(50.00)), None)
            .unwrap();

        ledger.reverse(&movement).unwrap();

        assert_eq!(ledger.balance(&payer).unwrap().amount(), dec!(100.00));
        assert_eq!(ledger.balance(&payee).unwrap().amount(), dec!(20.00));
        assert_eq!(ledger.movements().len(), 2);
        assert_eq!(ledger.movements()[1].kind, MovementKind::Reversal);
    }

    #[test]
    fn test_reverse_uncovered_is_consistency_error() {
        let (mut ledger, payer, payee) = funded_ledger();
        let movement = ledger
            .transfer(payer, payee, Money::new(dec!(50.00)), None)
            .unwrap();

        // The payee disburses most of the funds elsewhere.
        let elsewhere = AccountId::new();
        ledger
            .add_account(Account::new(elsewhere, "Elsewhere", Money::zero()))
            .unwrap();
        ledger
            .transfer(payee, elsewhere, Money::new(dec!(60.00)), None)
            .unwrap();

        let result = ledger.reverse(&movement);
        assert!(matches!(result, Err(LedgerError::ReversalNotCovered { .. })));
        // Balances untouched by the failed reversal.
        assert_eq!(ledger.balance(&payee).unwrap().amount(), dec!(10.00));
    }

    #[test]
    fn test_lock_order_is_symmetric() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_eq!(lock_order(a, b), lock_order(b, a));
        assert_eq!(lock_order(a, a), (a, a));
    }
}
