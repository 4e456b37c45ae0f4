//! Quantities of produce and the units they are measured in.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Unit of measure for a produce lot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Lbs,
    Heads,
    Crates,
    Boxes,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Lbs, Unit::Heads, Unit::Crates, Unit::Boxes];

    /// Whether quantities in this unit may be fractional.
    ///
    /// Weight can be split; heads, crates and boxes are counted whole.
    pub fn allows_fractional(self) -> bool {
        matches!(self, Unit::Lbs)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Lbs => "lbs",
            Unit::Heads => "heads",
            Unit::Crates => "crates",
            Unit::Boxes => "boxes",
        }
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown unit '{s}'")))
    }
}

/// A non-negative amount of produce tagged with its unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawQuantity", into = "RawQuantity")]
pub struct Quantity {
    value: Decimal,
    unit: Unit,
}

/// Wire shape of a [`Quantity`]; deserialization re-runs validation.
#[derive(Serialize, Deserialize)]
struct RawQuantity {
    value: Decimal,
    unit: Unit,
}

impl TryFrom<RawQuantity> for Quantity {
    type Error = DomainError;

    fn try_from(raw: RawQuantity) -> Result<Self, Self::Error> {
        Quantity::new(raw.value, raw.unit)
    }
}

impl From<Quantity> for RawQuantity {
    fn from(q: Quantity) -> Self {
        RawQuantity {
            value: q.value,
            unit: q.unit,
        }
    }
}

impl ValueObject for Quantity {}

impl Quantity {
    /// Build a quantity, enforcing `value >= 0` and the unit's fraction rule.
    pub fn new(value: Decimal, unit: Unit) -> DomainResult<Self> {
        if value < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "quantity cannot be negative (got {value} {unit})"
            )));
        }
        ensure_measurable(value, unit)?;
        Ok(Self {
            value: value.normalize(),
            unit,
        })
    }

    pub fn zero(unit: Unit) -> Self {
        Self {
            value: Decimal::ZERO,
            unit,
        }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Fail unless this quantity is measured in `unit`.
    pub fn ensure_unit(&self, unit: Unit) -> DomainResult<()> {
        if self.unit != unit {
            return Err(DomainError::validation(format!(
                "quantity is in {} but the lot is measured in {unit}",
                self.unit
            )));
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Quantity) -> DomainResult<Quantity> {
        other.ensure_unit(self.unit)?;
        let value = self
            .value
            .checked_add(other.value)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;
        Quantity::new(value, self.unit)
    }

    /// Subtract, failing if the result would be negative.
    pub fn checked_sub(&self, other: &Quantity) -> DomainResult<Quantity> {
        other.ensure_unit(self.unit)?;
        Quantity::new(self.value - other.value, self.unit)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Reject fractional values for units counted in whole items.
pub fn ensure_measurable(value: Decimal, unit: Unit) -> DomainResult<()> {
    if !unit.allows_fractional() && !value.fract().is_zero() {
        return Err(DomainError::FractionalQuantityNotAllowed {
            unit: unit.to_string(),
            requested: value.normalize(),
        });
    }
    Ok(())
}
