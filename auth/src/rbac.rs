//! Role membership checks over the current user.
//!
//! These are plain predicates. Anything richer than "does the user hold this
//! role" belongs to the host application.

use crate::state::{Role, User};

/// `true` if there is a user and it holds `role`.
///
/// # Examples
///
/// ```
/// # use auth_session::rbac::has_role;
/// # use auth_session::state::Role;
/// assert!(!has_role(None, Role::Admin));
/// ```
#[must_use]
pub fn has_role(user: Option<&User>, role: Role) -> bool {
    user.is_some_and(|u| u.role == role)
}

/// `true` if there is a user and its role is one of `roles`.
#[must_use]
pub fn has_any_role(user: Option<&User>, roles: &[Role]) -> bool {
    user.is_some_and(|u| roles.contains(&u.role))
}

/// `true` if there is a user holding every role in `roles`.
///
/// Users hold a single role, so this can only succeed when every entry equals
/// that role. An empty `roles` slice grants nothing.
#[must_use]
pub fn has_all_roles(user: Option<&User>, roles: &[Role]) -> bool {
    user.is_some_and(|u| !roles.is_empty() && roles.iter().all(|r| *r == u.role))
}
