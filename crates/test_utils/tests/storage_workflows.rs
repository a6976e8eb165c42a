//! End-to-end storage workflows against a real PostgreSQL
//!
//! These tests start a PostgreSQL testcontainer and are ignored by
//! default; run them with `cargo test -- --ignored`.

use rust_decimal_macros::dec;

use core_kernel::{IdempotencyKey, Money};
use domain_payment::{PaymentMethod, PaymentStatus};
use domain_trip::TripStatus;
use infra_db::{LedgerRepository, PaymentsRepository, TripsRepository};
use test_utils::{
    assert_amount, assert_conflict_error, assert_insufficient_funds,
    create_isolated_test_database, MerchantFixtures, MoneyFixtures, TestAccountBuilder,
    TripFixtures,
};

struct Harness {
    _db: test_utils::TestDatabase,
    ledger: LedgerRepository,
    trips: TripsRepository,
    payments: PaymentsRepository,
}

async fn harness() -> Harness {
    let db = create_isolated_test_database()
        .await
        .expect("test database");
    let pool = db.pool().clone();
    Harness {
        ledger: LedgerRepository::new(pool.clone()),
        trips: TripsRepository::new(pool.clone()),
        payments: PaymentsRepository::new(pool, MerchantFixtures::platform()),
        _db: db,
    }
}

#[tokio::test]
#[ignore]
async fn trip_lifecycle_to_settlement() {
    let h = harness().await;
    let passenger = TestAccountBuilder::new().build();
    let driver = TestAccountBuilder::new()
        .with_balance(MoneyFixtures::driver_balance())
        .build();
    h.ledger.create_account(&passenger).await.unwrap();
    h.ledger.create_account(&driver).await.unwrap();

    let trip = h
        .trips
        .request_trip(
            passenger.id,
            driver.id,
            TripFixtures::standard_distance(),
            MoneyFixtures::standard_rate(),
        )
        .await
        .unwrap();
    assert_eq!(trip.status, TripStatus::Created);
    assert_amount(trip.total, dec!(50.00));
    assert_amount(h.ledger.get_balance(passenger.id).await.unwrap(), dec!(50.00));
    assert_amount(h.ledger.get_balance(driver.id).await.unwrap(), dec!(350.00));

    let trip = h.trips.start_trip(trip.id).await.unwrap();
    assert_eq!(trip.status, TripStatus::InProgress);

    let payment = h
        .payments
        .create_trip_payment(trip.id, PaymentMethod::Pix, 1)
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert!(payment.qr_payload.is_some());

    let trip = h.trips.finalize_trip(trip.id).await.unwrap();
    assert_eq!(trip.status, TripStatus::Finalized);
}

#[tokio::test]
#[ignore]
async fn cancellation_restores_balances_and_is_idempotent() {
    let h = harness().await;
    let passenger = TestAccountBuilder::new().build();
    let driver = TestAccountBuilder::new()
        .with_balance(MoneyFixtures::driver_balance())
        .build();
    h.ledger.create_account(&passenger).await.unwrap();
    h.ledger.create_account(&driver).await.unwrap();

    let trip = h
        .trips
        .request_trip(
            passenger.id,
            driver.id,
            TripFixtures::standard_distance(),
            MoneyFixtures::standard_rate(),
        )
        .await
        .unwrap();

    let trip = h.trips.cancel_trip(trip.id).await.unwrap();
    assert_eq!(trip.status, TripStatus::Cancelled);
    assert_amount(h.ledger.get_balance(passenger.id).await.unwrap(), dec!(100.00));
    assert_amount(h.ledger.get_balance(driver.id).await.unwrap(), dec!(300.00));

    // Retrying the cancellation succeeds without another reversal.
    let trip = h.trips.cancel_trip(trip.id).await.unwrap();
    assert_eq!(trip.status, TripStatus::Cancelled);
    let movements = h.ledger.movements_for_trip(trip.id).await.unwrap();
    assert_eq!(movements.len(), 2);
}

#[tokio::test]
#[ignore]
async fn concurrent_requests_for_same_payer_admit_one_trip() {
    let h = harness().await;
    let passenger = TestAccountBuilder::new().build();
    let driver_a = TestAccountBuilder::new().build();
    let driver_b = TestAccountBuilder::new().build();
    for account in [&passenger, &driver_a, &driver_b] {
        h.ledger.create_account(account).await.unwrap();
    }

    let first = h.trips.request_trip(
        passenger.id,
        driver_a.id,
        TripFixtures::standard_distance(),
        MoneyFixtures::standard_rate(),
    );
    let second = h.trips.request_trip(
        passenger.id,
        driver_b.id,
        TripFixtures::standard_distance(),
        MoneyFixtures::standard_rate(),
    );
    let (first, second) = tokio::join!(first, second);

    // Exactly one wins; the loser sees the open-trip conflict.
    let failures = [&first, &second].iter().filter(|r| r.is_err()).count();
    assert_eq!(failures, 1, "one of the two requests must be rejected");
    if let Err(e) = &first {
        assert_conflict_error(e);
    }
    if let Err(e) = &second {
        assert_conflict_error(e);
    }

    // The fare was charged exactly once.
    assert_amount(h.ledger.get_balance(passenger.id).await.unwrap(), dec!(50.00));
}

#[tokio::test]
#[ignore]
async fn insufficient_funds_rejects_without_side_effects() {
    let h = harness().await;
    let passenger = TestAccountBuilder::new()
        .with_balance(Money::new(dec!(10.00)))
        .build();
    let driver = TestAccountBuilder::new().build();
    h.ledger.create_account(&passenger).await.unwrap();
    h.ledger.create_account(&driver).await.unwrap();

    let result = h
        .trips
        .request_trip(
            passenger.id,
            driver.id,
            TripFixtures::standard_distance(),
            MoneyFixtures::standard_rate(),
        )
        .await;
    assert_insufficient_funds(&result.unwrap_err());
    assert_amount(h.ledger.get_balance(passenger.id).await.unwrap(), dec!(10.00));
}

#[tokio::test]
#[ignore]
async fn external_payment_token_is_idempotent_under_races() {
    let h = harness().await;
    let payer = TestAccountBuilder::new().build();
    h.ledger.create_account(&payer).await.unwrap();

    let token = IdempotencyKey::new();
    let amount = Money::new(dec!(89.90));

    let (a, b) = tokio::join!(
        h.payments.create_external_payment(payer.id, amount, token),
        h.payments.create_external_payment(payer.id, amount, token),
    );
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.id, b.id, "both requests must observe the same payment");

    // A later replay also returns the stored record.
    let replay = h
        .payments
        .create_external_payment(payer.id, amount, token)
        .await
        .unwrap();
    assert_eq!(replay.id, a.id);
    assert_eq!(replay.status, PaymentStatus::Pending);
    assert!(replay.qr_payload.is_some());
}

#[tokio::test]
#[ignore]
async fn cancelling_pending_payment_moves_no_money() {
    let h = harness().await;
    let passenger = TestAccountBuilder::new().build();
    let driver = TestAccountBuilder::new()
        .with_balance(MoneyFixtures::driver_balance())
        .build();
    h.ledger.create_account(&passenger).await.unwrap();
    h.ledger.create_account(&driver).await.unwrap();

    let trip = h
        .trips
        .request_trip(
            passenger.id,
            driver.id,
            TripFixtures::standard_distance(),
            MoneyFixtures::standard_rate(),
        )
        .await
        .unwrap();

    // A credit payment with installments stays pending until confirmed.
    let payment = h
        .payments
        .create_trip_payment(trip.id, PaymentMethod::Credit, 3)
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);

    let payment = h.payments.cancel_payment(payment.id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Cancelled);

    // The trip keeps going and the fare stays where it is; only the
    // payment record changed.
    let trip = h.trips.find_trip(trip.id).await.unwrap();
    assert_eq!(trip.status, TripStatus::Created);
    assert_amount(h.ledger.get_balance(passenger.id).await.unwrap(), dec!(50.00));
    assert_amount(h.ledger.get_balance(driver.id).await.unwrap(), dec!(350.00));
    let movements = h.ledger.movements_for_trip(trip.id).await.unwrap();
    assert_eq!(movements.len(), 1);
}

#[tokio::test]
#[ignore]
async fn cancelling_payment_cancels_trip_and_reverses_fare() {
    let h = harness().await;
    let passenger = TestAccountBuilder::new().build();
    let driver = TestAccountBuilder::new()
        .with_balance(MoneyFixtures::driver_balance())
        .build();
    h.ledger.create_account(&passenger).await.unwrap();
    h.ledger.create_account(&driver).await.unwrap();

    let trip = h
        .trips
        .request_trip(
            passenger.id,
            driver.id,
            TripFixtures::standard_distance(),
            MoneyFixtures::standard_rate(),
        )
        .await
        .unwrap();
    let payment = h
        .payments
        .create_trip_payment(trip.id, PaymentMethod::Pix, 1)
        .await
        .unwrap();

    let payment = h.payments.cancel_payment(payment.id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);

    let trip = h.trips.find_trip(trip.id).await.unwrap();
    assert_eq!(trip.status, TripStatus::Cancelled);
    assert_amount(h.ledger.get_balance(passenger.id).await.unwrap(), dec!(100.00));

    // Cancelling the trip afterwards is a no-op, not a second reversal.
    h.trips.cancel_trip(trip.id).await.unwrap();
    let movements = h.ledger.movements_for_trip(trip.id).await.unwrap();
    assert_eq!(movements.len(), 2);
}
