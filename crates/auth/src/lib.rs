//! `farmlink-auth`: caller identity and ownership policy.
//!
//! Authentication happens elsewhere (the identity provider). This crate only
//! models the already-authenticated caller and the checks the application
//! layer runs before touching a lot or an order. No IO, no session state.

pub mod authorize;
pub mod identity;

pub use authorize::{require_owner, require_owner_or_party, require_role, AuthzError};
pub use identity::{Identity, Role};
