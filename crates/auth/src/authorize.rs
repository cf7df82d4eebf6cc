use thiserror::Error;

use crate::{Operation, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("forbidden: role '{0}' is not permitted")]
    Forbidden(Role),
}

/// Authorize a caller against a set of permitted roles.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize<'a>(
    caller: Option<&'a Principal>,
    allowed: &[Role],
) -> Result<&'a Principal, AuthzError> {
    let principal = caller.ok_or(AuthzError::Unauthenticated)?;

    if allowed.contains(&principal.role) {
        Ok(principal)
    } else {
        Err(AuthzError::Forbidden(principal.role))
    }
}

/// Authorize a caller for a declared operation (see [`Operation::allowed_roles`]).
pub fn authorize_operation(
    caller: Option<&Principal>,
    operation: Operation,
) -> Result<&Principal, AuthzError> {
    authorize(caller, operation.allowed_roles())
}

#[cfg(test)]
mod tests {
    use laundry_core::UserId;

    use super::*;

    fn caller(role: Role) -> Principal {
        Principal::new(UserId::new(), role)
    }

    #[test]
    fn missing_caller_is_unauthenticated() {
        assert_eq!(
            authorize(None, &[Role::Admin]),
            Err(AuthzError::Unauthenticated)
        );
    }

    #[test]
    fn role_outside_set_is_forbidden() {
        let p = caller(Role::Employee);
        assert_eq!(
            authorize(Some(&p), &[Role::Admin, Role::Manager]),
            Err(AuthzError::Forbidden(Role::Employee))
        );
    }

    #[test]
    fn role_inside_set_returns_principal() {
        let p = caller(Role::Manager);
        let granted = authorize(Some(&p), &[Role::Admin, Role::Manager]).unwrap();
        assert_eq!(granted.user_id, p.user_id);
    }

    #[test]
    fn operation_gate_uses_policy_table() {
        let manager = caller(Role::Manager);
        let admin = caller(Role::Admin);

        assert!(authorize_operation(Some(&manager), Operation::ApproveRequest).is_ok());
        assert_eq!(
            authorize_operation(Some(&manager), Operation::FulfillRequest),
            Err(AuthzError::Forbidden(Role::Manager))
        );
        assert!(authorize_operation(Some(&admin), Operation::FulfillRequest).is_ok());
    }
}
