//! # Mutation policy
//!
//! A point may be modified by an administrator or by the user who owns it.

use crate::store::Point;

use super::crypto::constant_time_str_eq;
use super::errors::{AuthError, AuthResult};
use super::user::User;

pub fn may_mutate(user: &User, point: &Point) -> bool {
    user.is_admin() || constant_time_str_eq(&user.username, &point.data.owner)
}

/// Like [`may_mutate`], as an error for callers that propagate
pub fn require_mutation(user: &User, point: &Point) -> AuthResult<()> {
    if may_mutate(user, point) {
        Ok(())
    } else {
        Err(AuthError::Unauthorized {
            username: user.username.clone(),
            point_id: point.id.value(),
        })
    }
}

/// Store-wide operations such as reset are reserved to administrators.
pub fn require_admin(user: &User) -> AuthResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AuthError::AdminRequired {
            username: user.username.clone(),
        })
    }
}
