use thiserror::Error;

use farmlink_core::UserId;

use crate::{Identity, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires role '{required}', caller is '{actual}'")]
    WrongRole { required: Role, actual: Role },

    #[error("forbidden: caller does not own this resource")]
    NotOwner,
}

/// Require the caller to act in `required` role.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn require_role(identity: &Identity, required: Role) -> Result<(), AuthzError> {
    if identity.is(required) {
        Ok(())
    } else {
        Err(AuthzError::WrongRole {
            required,
            actual: identity.role,
        })
    }
}

/// Require the caller to be `owner` (e.g. the farmer who listed a lot).
pub fn require_owner(identity: &Identity, owner: UserId) -> Result<(), AuthzError> {
    if identity.user_id == owner {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Require the caller to be one of the parties of an order (buyer or lot owner).
pub fn require_owner_or_party(
    identity: &Identity,
    owner: UserId,
    party: UserId,
) -> Result<(), AuthzError> {
    if identity.user_id == owner || identity.user_id == party {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}
