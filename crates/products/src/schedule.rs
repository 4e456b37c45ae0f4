//! Tiered price schedules.
//!
//! A schedule is a set of `{min_quantity, unit_price}` breakpoints. The unit
//! price for an order is taken from the tier with the greatest `min_quantity`
//! that does not exceed the requested quantity. Bounds are inclusive: ordering
//! exactly `min_quantity` units gets that tier's price.
//!
//! ```text
//! tiers: (1, $10) (10, $8) (50, $6)
//!
//!   qty   1 ........ 9 | 10 ....... 49 | 50 ..........
//!   price      $10     |      $8       |     $6
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use farmlink_core::quantity::ensure_measurable;
use farmlink_core::{DomainError, DomainResult, Money, Quantity, ValueObject};

/// One breakpoint of a price schedule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceTier {
    pub min_quantity: u32,
    pub unit_price: Money,
}

impl ValueObject for PriceTier {}

impl PriceTier {
    pub fn new(min_quantity: u32, unit_price: Money) -> Self {
        Self {
            min_quantity,
            unit_price,
        }
    }
}

/// Price preview for a quantity: the tier that applies and what it costs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub tier_min_quantity: u32,
    pub unit_price: Money,
    pub total: Money,
}

/// A validated, non-empty schedule sorted ascending by `min_quantity`.
///
/// The only way to build one is [`PriceSchedule::validate`] (deserialization
/// goes through it too), so every instance upholds the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriceTier>", into = "Vec<PriceTier>")]
pub struct PriceSchedule {
    tiers: Vec<PriceTier>,
}

impl PriceSchedule {
    /// Validate an unordered set of candidate tiers and sort them.
    ///
    /// Rejects an empty set, `min_quantity < 1`, unit prices below $0.01 (or
    /// with more than four decimal places) and duplicate `min_quantity` values.
    pub fn validate(tiers: impl IntoIterator<Item = PriceTier>) -> DomainResult<Self> {
        let mut tiers: Vec<PriceTier> = tiers.into_iter().collect();

        if tiers.is_empty() {
            return Err(DomainError::invalid_schedule(
                "a schedule needs at least one tier",
            ));
        }

        for tier in &tiers {
            if tier.min_quantity < 1 {
                return Err(DomainError::invalid_schedule(format!(
                    "min_quantity must be at least 1 (got {})",
                    tier.min_quantity
                )));
            }
            if !tier.unit_price.is_valid_unit_price() {
                return Err(DomainError::invalid_schedule(format!(
                    "unit price {} for min_quantity {} must be at least {} with at most {} decimal places",
                    tier.unit_price,
                    tier.min_quantity,
                    Money::MIN_UNIT_PRICE,
                    Money::MAX_UNIT_PRICE_SCALE
                )));
            }
        }

        tiers.sort_by_key(|t| t.min_quantity);

        if let Some(dup) = tiers
            .windows(2)
            .find(|pair| pair[0].min_quantity == pair[1].min_quantity)
        {
            return Err(DomainError::invalid_schedule(format!(
                "duplicate min_quantity {}",
                dup[0].min_quantity
            )));
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[PriceTier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Lowest `min_quantity`; anything below it cannot be priced.
    pub fn floor(&self) -> u32 {
        self.tiers[0].min_quantity
    }

    /// The tier with the greatest `min_quantity <= quantity`.
    pub fn tier_for(&self, quantity: &Quantity) -> DomainResult<&PriceTier> {
        ensure_measurable(quantity.value(), quantity.unit())?;

        let requested = quantity.value();
        let idx = self
            .tiers
            .partition_point(|t| Decimal::from(t.min_quantity) <= requested);

        if idx == 0 {
            return Err(DomainError::NoApplicableTier {
                requested,
                floor: self.floor(),
            });
        }
        Ok(&self.tiers[idx - 1])
    }

    /// Effective unit price for `quantity`.
    pub fn resolve_price(&self, quantity: &Quantity) -> DomainResult<Money> {
        self.tier_for(quantity).map(|t| t.unit_price)
    }

    /// `resolve_price(quantity) * quantity`, rounded to cents half-up.
    pub fn compute_total(&self, quantity: &Quantity) -> DomainResult<Money> {
        self.resolve_price(quantity)?.times(quantity.value())
    }

    pub fn quote(&self, quantity: &Quantity) -> DomainResult<PriceQuote> {
        let tier = self.tier_for(quantity)?;
        Ok(PriceQuote {
            tier_min_quantity: tier.min_quantity,
            unit_price: tier.unit_price,
            total: tier.unit_price.times(quantity.value())?,
        })
    }
}

impl TryFrom<Vec<PriceTier>> for PriceSchedule {
    type Error = DomainError;

    fn try_from(tiers: Vec<PriceTier>) -> Result<Self, Self::Error> {
        PriceSchedule::validate(tiers)
    }
}

impl From<PriceSchedule> for Vec<PriceTier> {
    fn from(schedule: PriceSchedule) -> Self {
        schedule.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmlink_core::Unit;
    use rust_decimal_macros::dec;

    fn tier(min: u32, price: Decimal) -> PriceTier {
        PriceTier::new(min, Money::new(price).unwrap())
    }

    fn boxes(n: u32) -> Quantity {
        Quantity::new(Decimal::from(n), Unit::Boxes).unwrap()
    }

    fn standard_schedule() -> PriceSchedule {
        PriceSchedule::validate(vec![
            tier(1, dec!(10)),
            tier(10, dec!(8)),
            tier(50, dec!(6)),
        ])
        .unwrap()
    }

    #[test]
    fn resolves_greatest_tier_not_exceeding_quantity() {
        let schedule = standard_schedule();
        assert_eq!(schedule.resolve_price(&boxes(5)).unwrap().amount(), dec!(10));
        assert_eq!(schedule.resolve_price(&boxes(10)).unwrap().amount(), dec!(8));
        assert_eq!(schedule.resolve_price(&boxes(49)).unwrap().amount(), dec!(8));
        assert_eq!(schedule.resolve_price(&boxes(50)).unwrap().amount(), dec!(6));
        assert_eq!(schedule.resolve_price(&boxes(5000)).unwrap().amount(), dec!(6));
    }

    #[test]
    fn validate_sorts_unordered_tiers() {
        let schedule = PriceSchedule::validate(vec![
            tier(50, dec!(6)),
            tier(1, dec!(10)),
            tier(10, dec!(8)),
        ])
        .unwrap();
        let mins: Vec<u32> = schedule.tiers().iter().map(|t| t.min_quantity).collect();
        assert_eq!(mins, vec![1, 10, 50]);
        assert_eq!(schedule.floor(), 1);
    }

    #[test]
    fn validate_rejects_duplicate_min_quantity() {
        let err = PriceSchedule::validate(vec![tier(5, dec!(10)), tier(5, dec!(8))]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidSchedule(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn validate_rejects_zero_min_quantity() {
        let err = PriceSchedule::validate(vec![tier(0, dec!(10))]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidSchedule(_)));
    }

    #[test]
    fn validate_rejects_empty_and_sub_cent_prices() {
        assert!(matches!(
            PriceSchedule::validate(Vec::new()),
            Err(DomainError::InvalidSchedule(_))
        ));
        assert!(matches!(
            PriceSchedule::validate(vec![tier(1, dec!(0.001))]),
            Err(DomainError::InvalidSchedule(_))
        ));
        assert!(matches!(
            PriceSchedule::validate(vec![tier(1, dec!(0))]),
            Err(DomainError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn quantity_below_floor_has_no_tier() {
        let schedule = PriceSchedule::validate(vec![tier(10, dec!(8))]).unwrap();
        let err = schedule.resolve_price(&boxes(9)).unwrap_err();
        assert_eq!(
            err,
            DomainError::NoApplicableTier {
                requested: dec!(9),
                floor: 10,
            }
        );
    }

    #[test]
    fn fractional_pounds_resolve_against_integer_breakpoints() {
        let schedule = standard_schedule();
        let q = Quantity::new(dec!(9.5), Unit::Lbs).unwrap();
        assert_eq!(schedule.resolve_price(&q).unwrap().amount(), dec!(10));

        let below = Quantity::new(dec!(0.5), Unit::Lbs).unwrap();
        assert!(matches!(
            schedule.resolve_price(&below),
            Err(DomainError::NoApplicableTier { .. })
        ));
    }

    #[test]
    fn compute_total_rounds_half_up() {
        let schedule = PriceSchedule::validate(vec![tier(1, dec!(8.335))]).unwrap();
        let total = schedule.compute_total(&boxes(3)).unwrap();
        assert_eq!(total.amount(), dec!(25.01));
    }

    #[test]
    fn quote_reports_tier_and_total() {
        let quote = standard_schedule().quote(&boxes(12)).unwrap();
        assert_eq!(quote.tier_min_quantity, 10);
        assert_eq!(quote.unit_price.amount(), dec!(8));
        assert_eq!(quote.total.amount(), dec!(96));
    }

    #[test]
    fn deserializing_revalidates() {
        let json = r#"[{"min_quantity":10,"unit_price":"8"},{"min_quantity":1,"unit_price":"10"}]"#;
        let schedule: PriceSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.floor(), 1);

        let dup = r#"[{"min_quantity":1,"unit_price":"8"},{"min_quantity":1,"unit_price":"10"}]"#;
        assert!(serde_json::from_str::<PriceSchedule>(dup).is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::collection::btree_map;
        use proptest::prelude::*;

        fn arb_tiers() -> impl Strategy<Value = Vec<PriceTier>> {
            btree_map(1u32..500, 1u64..100_000, 1..8).prop_map(|m| {
                m.into_iter()
                    .map(|(min, cents)| PriceTier::new(min, Money::from_cents(cents)))
                    .collect()
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: the resolved price is the price of the greatest tier with min <= quantity.
            #[test]
            fn resolve_matches_brute_force(
                tiers in arb_tiers(),
                offset in 0u32..1000,
            ) {
                let mut shuffled = tiers.clone();
                shuffled.reverse();
                let schedule = PriceSchedule::validate(shuffled).unwrap();
                let qty = schedule.floor() + offset;

                let expected = tiers
                    .iter()
                    .filter(|t| t.min_quantity <= qty)
                    .max_by_key(|t| t.min_quantity)
                    .map(|t| t.unit_price)
                    .unwrap();

                prop_assert_eq!(schedule.resolve_price(&boxes(qty)).unwrap(), expected);
            }

            /// Property: validated schedules are strictly ascending.
            #[test]
            fn validated_tiers_are_strictly_ascending(tiers in arb_tiers()) {
                let schedule = PriceSchedule::validate(tiers.into_iter().rev()).unwrap();
                for pair in schedule.tiers().windows(2) {
                    prop_assert!(pair[0].min_quantity < pair[1].min_quantity);
                }
            }
        }
    }
}
