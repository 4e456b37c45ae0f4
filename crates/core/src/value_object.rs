//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: two quantities of `5 lbs` are the same
/// quantity, two `$8.00` prices are the same price. They are immutable; to
/// "change" one, build a new one through its validating constructor.
///
/// Implemented by [`crate::Money`], [`crate::Quantity`] and the price tiers of
/// the products crate.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
