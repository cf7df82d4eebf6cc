//! API-side role gate.
//!
//! Each handler names its operation; the role table lives in `laundry-auth`.

use axum::http::StatusCode;
use axum::response::Response;
use tracing::warn;

use laundry_auth::{AuthzError, Operation, authorize_operation};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Check the caller against the roles allowed for `operation`.
pub fn authorize(principal: &PrincipalContext, operation: Operation) -> Result<(), Response> {
    authorize_operation(Some(principal.principal()), operation)
        .map(|_| ())
        .map_err(|e| {
            warn!(user_id = %principal.user_id(), role = %principal.role(), ?operation, "access denied");
            authz_error_to_response(e)
        })
}

pub fn authz_error_to_response(err: AuthzError) -> Response {
    match err {
        AuthzError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", err.to_string())
        }
        AuthzError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use laundry_auth::{Principal, Role};
    use laundry_core::UserId;

    use super::*;

    fn ctx(role: Role) -> PrincipalContext {
        PrincipalContext::new(Principal::new(UserId::new(), role))
    }

    #[test]
    fn manager_may_approve_but_not_fulfill() {
        assert!(authorize(&ctx(Role::Manager), Operation::ApproveRequest).is_ok());

        let denied = authorize(&ctx(Role::Manager), Operation::FulfillRequest).unwrap_err();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unauthenticated_maps_to_401() {
        let res = authz_error_to_response(AuthzError::Unauthenticated);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
