//! `laundry-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how
//! to verify a bearer token and whether a role may perform an operation.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod policy;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize, authorize_operation};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator, TokenError, issue_hs256};
pub use policy::Operation;
pub use principal::Principal;
pub use roles::Role;
