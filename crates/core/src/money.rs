//! Non-negative currency amounts.
//!
//! Amounts are `rust_decimal::Decimal`, never floats. Unit prices keep the
//! precision the farmer entered (up to [`Money::MAX_UNIT_PRICE_SCALE`] places);
//! anything the buyer actually pays is rounded to cents with round-half-up.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A non-negative monetary amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Smallest price a tier may charge per unit ($0.01).
    pub const MIN_UNIT_PRICE: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// Decimal places kept on a unit price.
    pub const MAX_UNIT_PRICE_SCALE: u32 = 4;

    /// Decimal places kept on totals.
    pub const CURRENCY_SCALE: u32 = 2;

    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "money amount cannot be negative (got {amount})"
            )));
        }
        Ok(Self(amount.normalize()))
    }

    pub fn from_cents(cents: u64) -> Self {
        Self(Decimal::from(cents) / Decimal::ONE_HUNDRED)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this amount is acceptable as a tier's unit price.
    pub fn is_valid_unit_price(&self) -> bool {
        *self >= Self::MIN_UNIT_PRICE && self.0.scale() <= Self::MAX_UNIT_PRICE_SCALE
    }

    /// Multiply by a quantity and round to cents, half-up.
    pub fn times(&self, quantity: Decimal) -> DomainResult<Money> {
        let raw = self
            .0
            .checked_mul(quantity)
            .ok_or_else(|| DomainError::validation("price overflow"))?;
        Money::new(round_half_up(raw))
    }
}

fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(Money::CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.0.scale() <= Self::CURRENCY_SCALE {
            write!(f, "${:.2}", self.0)
        } else {
            write!(f, "${}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_amount_is_rejected() {
        assert!(Money::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn totals_round_half_up_to_cents() {
        let price = Money::new(dec!(8.335)).unwrap();
        assert_eq!(price.times(dec!(3)).unwrap().amount(), dec!(25.01));
    }

    #[test]
    fn exact_midpoint_rounds_up() {
        let price = Money::new(dec!(0.125)).unwrap();
        assert_eq!(price.times(dec!(1)).unwrap().amount(), dec!(0.13));
    }

    #[test]
    fn unit_price_floor_is_one_cent() {
        assert!(Money::new(dec!(0.01)).unwrap().is_valid_unit_price());
        assert!(!Money::new(dec!(0.009)).unwrap().is_valid_unit_price());
        assert!(!Money::ZERO.is_valid_unit_price());
    }

    #[test]
    fn unit_price_precision_is_bounded() {
        assert!(Money::new(dec!(1.2345)).unwrap().is_valid_unit_price());
        assert!(!Money::new(dec!(1.23456)).unwrap().is_valid_unit_price());
    }

    #[test]
    fn display_pads_to_cents() {
        assert_eq!(Money::from_cents(1000).to_string(), "$10.00");
        assert_eq!(Money::new(dec!(8.335)).unwrap().to_string(), "$8.335");
    }

    #[test]
    fn deserialize_rejects_negative() {
        let err = serde_json::from_str::<Money>("\"-1.00\"");
        assert!(err.is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn totals_are_cents_within_half_a_cent(
                cents in 1u64..1_000_000,
                ten_thousandths in 0u64..100,
                qty in 0u64..10_000,
            ) {
                let price = Money::new(
                    Decimal::from(cents) / Decimal::ONE_HUNDRED
                        + Decimal::from(ten_thousandths) / Decimal::from(10_000),
                )
                .unwrap();
                let qty = Decimal::from(qty);
                let total = price.times(qty).unwrap().amount();
                let exact = price.amount() * qty;
                prop_assert!(total.scale() <= Money::CURRENCY_SCALE);
                prop_assert!((total - exact).abs() <= Decimal::new(5, 3));
            }
        }
    }
}
