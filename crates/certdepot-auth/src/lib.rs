//! Authentication primitives for CertDepot
//!
//! Argon2id password hashing for stored users and HS256 JWT session
//! tokens for the web/API surfaces.

pub mod jwt;
pub mod password;

pub use jwt::{JwtError, JwtValidator, SessionClaims, SESSION_VALIDITY_HOURS};
pub use password::{hash_password, verify_password, PasswordError};
