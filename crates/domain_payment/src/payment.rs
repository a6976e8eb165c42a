//! Payment record aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{AccountId, IdempotencyKey, Money, PaymentId, TripId};

use crate::error::PaymentError;
use crate::method::PaymentMethod;

/// Upper bound on installments for deferred methods
pub const MAX_INSTALLMENTS: u32 = 12;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    /// Checks if a status transition is valid
    pub fn can_transition_to(&self, new_status: &PaymentStatus) -> bool {
        matches!(
            (self, new_status),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Cancelled)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }

    /// Cancelled and refunded payments never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Cancelled | PaymentStatus::Refunded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "cancelled" => Some(PaymentStatus::Cancelled),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a cancellation request
///
/// A pending payment is cancelled outright; a paid payment is refunded,
/// which obliges the caller to reverse the associated funds. Cancelling a
/// payment that is already terminal is a successful no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentCancelOutcome {
    /// Already cancelled or refunded; nothing to do
    NoOp,
    /// Was pending, now cancelled; no funds had moved
    CancelledPending,
    /// Was paid, now refunded; funds must flow back
    RefundedPaid,
}

/// A payment record
///
/// `trip_id` is set for trip-fare payments and absent for external
/// payments; `token` and `qr_payload` are only populated for external
/// payments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub trip_id: Option<TripId>,
    pub payer_id: AccountId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub installments: u32,
    /// Equal share of the total, present only when installments > 1
    pub installment_amount: Option<Money>,
    pub status: PaymentStatus,
    pub token: Option<IdempotencyKey>,
    pub qr_payload: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Creates a payment record
    ///
    /// Synchronous methods settle immediately and start in `paid`;
    /// deferred methods start in `pending`. The installment amount is the
    /// total split evenly, rounded to cents.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` for a zero or negative total
    /// - `InvalidInstallments` outside 1..=12
    /// - `InstallmentsNotSupported` when splitting a pix or debit payment
    pub fn new(
        trip_id: Option<TripId>,
        payer_id: AccountId,
        amount: Money,
        method: PaymentMethod,
        installments: u32,
    ) -> Result<Self, PaymentError> {
        let status = if method.settles_synchronously() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        };
        Self::build(trip_id, payer_id, amount, method, installments, status)
    }

    /// Creates an externally initiated instant payment
    ///
    /// Not tied to a trip, single installment, pending until the payer
    /// settles the presented payload.
    pub fn new_external(
        payer_id: AccountId,
        amount: Money,
        token: IdempotencyKey,
    ) -> Result<Self, PaymentError> {
        let payment = Self::build(
            None,
            payer_id,
            amount,
            PaymentMethod::Pix,
            1,
            PaymentStatus::Pending,
        )?;
        Ok(payment.with_token(token))
    }

    fn build(
        trip_id: Option<TripId>,
        payer_id: AccountId,
        amount: Money,
        method: PaymentMethod,
        installments: u32,
        status: PaymentStatus,
    ) -> Result<Self, PaymentError> {
        if !amount.is_positive() {
            return Err(PaymentError::NonPositiveAmount(amount.amount()));
        }
        if installments == 0 || installments > MAX_INSTALLMENTS {
            return Err(PaymentError::InvalidInstallments(installments));
        }
        if installments > 1 && !method.supports_installments() {
            return Err(PaymentError::InstallmentsNotSupported(method.to_string()));
        }

        let installment_amount = if installments > 1 {
            Some(
                amount
                    .split(installments)
                    .map_err(|_| PaymentError::InvalidInstallments(installments))?,
            )
        } else {
            None
        };
        let now = Utc::now();
        let payment = Self {
            id: PaymentId::new(),
            trip_id,
            payer_id,
            amount,
            method,
            installments,
            installment_amount,
            status,
            token: None,
            qr_payload: None,
            created_at: now,
            updated_at: now,
        };
        info!(payment_id = %payment.id, %method, status = %payment.status, "payment created");
        Ok(payment)
    }

    /// Attaches the idempotency token of an external payment
    pub fn with_token(mut self, token: IdempotencyKey) -> Self {
        self.token = Some(token);
        self
    }

    /// Attaches the encoded pix copy-and-paste payload
    pub fn with_qr_payload(mut self, payload: impl Into<String>) -> Self {
        self.qr_payload = Some(payload.into());
        self
    }

    /// Confirms settlement of a deferred payment
    pub fn mark_paid(&mut self) -> Result<(), PaymentError> {
        self.transition_to(PaymentStatus::Paid)
    }

    /// Cancels or refunds the payment
    ///
    /// Idempotent: terminal payments report `NoOp` and stay unchanged.
    pub fn cancel(&mut self) -> Result<PaymentCancelOutcome, PaymentError> {
        match self.status {
            PaymentStatus::Cancelled | PaymentStatus::Refunded => Ok(PaymentCancelOutcome::NoOp),
            PaymentStatus::Pending => {
                self.transition_to(PaymentStatus::Cancelled)?;
                Ok(PaymentCancelOutcome::CancelledPending)
            }
            PaymentStatus::Paid => {
                self.transition_to(PaymentStatus::Refunded)?;
                Ok(PaymentCancelOutcome::RefundedPaid)
            }
        }
    }

    fn transition_to(&mut self, new_status: PaymentStatus) -> Result<(), PaymentError> {
        if !self.status.can_transition_to(&new_status) {
            return Err(PaymentError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: new_status.to_string(),
            });
        }
        info!(payment_id = %self.id, from = %self.status, to = %new_status, "payment status changed");
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pix_settles_immediately() {
        let payment = PaymentRecord::new(
            None,
            AccountId::new(),
            Money::new(dec!(120.00)),
            PaymentMethod::Pix,
            1,
        )
        .unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.installment_amount, None);
    }

    #[test]
    fn test_credit_starts_pending_with_installments() {
        let payment = PaymentRecord::new(
            None,
            AccountId::new(),
            Money::new(dec!(100.00)),
            PaymentMethod::Credit,
            3,
        )
        .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.installment_amount.unwrap().amount(), dec!(33.33));
    }

    #[test]
    fn test_external_payment_starts_pending() {
        let token = core_kernel::IdempotencyKey::new();
        let payment =
            PaymentRecord::new_external(AccountId::new(), Money::new(dec!(75.00)), token)
                .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.method, PaymentMethod::Pix);
        assert_eq!(payment.token, Some(token));
        assert_eq!(payment.trip_id, None);
    }

    #[test]
    fn test_installment_bounds() {
        for bad in [0u32, 13] {
            let result = PaymentRecord::new(
                None,
                AccountId::new(),
                Money::new(dec!(100.00)),
                PaymentMethod::Credit,
                bad,
            );
            assert!(matches!(result, Err(PaymentError::InvalidInstallments(_))));
        }
    }

    #[test]
    fn test_installments_rejected_for_synchronous_methods() {
        let result = PaymentRecord::new(
            None,
            AccountId::new(),
            Money::new(dec!(100.00)),
            PaymentMethod::Debit,
            2,
        );
        assert!(matches!(
            result,
            Err(PaymentError::InstallmentsNotSupported(_))
        ));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let result = PaymentRecord::new(None, AccountId::new(), Money::zero(), PaymentMethod::Pix, 1);
        assert!(matches!(result, Err(PaymentError::NonPositiveAmount(_))));
    }

    #[test]
    fn test_cancel_pending_payment() {
        let mut payment = PaymentRecord::new(
            None,
            AccountId::new(),
            Money::new(dec!(50.00)),
            PaymentMethod::Boleto,
            1,
        )
        .unwrap();
        assert_eq!(
            payment.cancel().unwrap(),
            PaymentCancelOutcome::CancelledPending
        );
        assert_eq!(payment.status, PaymentStatus::Cancelled);
    }

    #[test]
    fn test_cancel_paid_payment_refunds() {
        let mut payment =
            PaymentRecord::new(None, AccountId::new(), Money::new(dec!(50.00)), PaymentMethod::Pix, 1)
                .unwrap();
        assert_eq!(payment.cancel().unwrap(), PaymentCancelOutcome::RefundedPaid);
        assert_eq!(payment.status, PaymentStatus::Refunded);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut payment =
            PaymentRecord::new(None, AccountId::new(), Money::new(dec!(50.00)), PaymentMethod::Pix, 1)
                .unwrap();
        payment.cancel().unwrap();
        assert_eq!(payment.cancel().unwrap(), PaymentCancelOutcome::NoOp);
        assert_eq!(payment.status, PaymentStatus::Refunded);
    }

    #[test]
    fn test_mark_paid_settles_deferred_payment() {
        let mut payment = PaymentRecord::new(
            None,
            AccountId::new(),
            Money::new(dec!(75.00)),
            PaymentMethod::Credit,
            1,
        )
        .unwrap();
        payment.mark_paid().unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        // Paying twice is a conflict, not a silent overwrite.
        assert!(payment.mark_paid().is_err());
    }
}
