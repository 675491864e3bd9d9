//! Authentication
//!
//! Handles:
//! - Access/refresh token issuance and verification
//! - Password hashing
//! - Authentication extractors

mod middleware;
mod password;
pub mod token;

pub use middleware::{ACCESS_TOKEN_COOKIE, CurrentUser, MaybeUser, REFRESH_TOKEN_COOKIE};
pub use password::{hash_password, verify_password};
pub use token::{TokenClaims, TokenKind, create_token, verify_token};
