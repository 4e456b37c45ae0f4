//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// pricing, inventory, lifecycle). Storage and authorization failures belong to
/// the layers that raise them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input shape (empty name, negative quantity, unit mismatch, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A price schedule was rejected by `PriceSchedule::validate`.
    #[error("invalid price schedule: {0}")]
    InvalidSchedule(String),

    /// The requested quantity is below the lowest price tier.
    #[error("no price tier applies to quantity {requested} (lowest tier starts at {floor})")]
    NoApplicableTier { requested: Decimal, floor: u32 },

    /// A fractional quantity was supplied for a unit counted in whole items.
    #[error("unit '{unit}' does not allow fractional quantities (got {requested})")]
    FractionalQuantityNotAllowed { unit: String, requested: Decimal },

    /// Not enough unreserved stock to satisfy a reservation.
    #[error("insufficient quantity: requested {requested}, available {available}")]
    InsufficientQuantity { requested: Decimal, available: Decimal },

    /// A lifecycle transition is not allowed from the current state.
    #[error("cannot {action} an order that is {from}")]
    InvalidTransition { from: String, action: String },

    /// A lot cannot be removed while orders still reference it.
    #[error("lot is referenced by {open_orders} open order(s)")]
    LotInUse { open_orders: usize },

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. stale version / duplicate creation).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_schedule(msg: impl Into<String>) -> Self {
        Self::InvalidSchedule(msg.into())
    }

    pub fn invalid_transition(from: impl Into<String>, action: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            action: action.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
