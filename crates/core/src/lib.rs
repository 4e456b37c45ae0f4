//! `farmlink-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, the aggregate contract and the
//! quantity/money value objects every marketplace module prices with.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod money;
pub mod quantity;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, UserId};
pub use money::Money;
pub use quantity::{Quantity, Unit};
pub use value_object::ValueObject;
