//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities. Fixtures are consistent
//! and predictable so unit tests can assert on exact values.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::Money;
use domain_pix::Merchant;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The standard opening balance of a passenger account
    pub fn passenger_balance() -> Money {
        Money::new(dec!(100.00))
    }

    /// The standard opening balance of a driver account
    pub fn driver_balance() -> Money {
        Money::new(dec!(300.00))
    }

    /// The standard per-kilometre rate
    pub fn standard_rate() -> Money {
        Money::new(dec!(5.00))
    }

    /// An amount no fixture account can cover
    pub fn more_than_anyone_has() -> Money {
        Money::new(dec!(999999.00))
    }
}

/// Fixture for trip test data
pub struct TripFixtures;

impl TripFixtures {
    /// The standard trip distance, ten kilometres
    pub fn standard_distance() -> Decimal {
        dec!(10)
    }

    /// The fare for the standard distance at the standard rate
    pub fn standard_fare() -> Money {
        Money::new(dec!(50.00))
    }
}

/// Fixture for the platform merchant used in pix payloads
pub struct MerchantFixtures;

impl MerchantFixtures {
    /// The platform merchant descriptor
    pub fn platform() -> Merchant {
        Merchant::new("pagamentos@ridepay.com.br", "RIDEPAY PAGAMENTOS", "SAO PAULO")
    }

    /// A merchant whose name and city exceed the payload field limits
    pub fn oversized() -> Merchant {
        Merchant::new(
            "pagamentos@ridepay.com.br",
            "A MERCHANT NAME THAT IS FAR TOO LONG FOR THE FIELD",
            "A CITY NAME THAT IS TOO LONG",
        )
    }
}
