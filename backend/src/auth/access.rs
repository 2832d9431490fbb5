//! Coarse permission checks gating resource operations.
//!
//! Access is a capability-list match: an operation names the permissions it
//! accepts, and an actor passes when their granted set intersects it. There
//! is no hierarchy or implication between permissions; the only special
//! tokens are the requirement-side wildcard and the superuser flag.

use crate::database::models::User;
use crate::errors::{ServiceError, ServiceResult};

/// Requirement-side wildcard: any authenticated actor is acceptable.
pub const WILDCARD: &str = "*";

/// Whether `actor` satisfies any of the `required` permissions.
///
/// Grants when the actor's permission set contains any element of `required`,
/// when `required` itself contains the wildcard, or when the actor is a
/// superuser (which bypasses all checks).
pub fn has_access(actor: &User, required: &[&str]) -> bool {
    if actor.is_superuser {
        return true;
    }
    if required.contains(&WILDCARD) {
        return true;
    }

    let granted = actor.permission_set();
    required.iter().any(|p| granted.contains(*p))
}

/// Like [`has_access`], but fails with `PermissionDenied`.
pub fn need_access(actor: &User, required: &[&str]) -> ServiceResult<()> {
    if has_access(actor, required) {
        Ok(())
    } else {
        tracing::debug!(
            "Access denied for {}: requires one of [{}]",
            actor.email,
            required.join(", ")
        );
        Err(ServiceError::permission_denied(format!(
            "Requires one of: {}",
            required.join(", ")
        )))
    }
}
