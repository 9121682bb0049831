pub mod auth;

pub use auth::{require_auth, require_auth_page, AuthUser, JwtState, SESSION_COOKIE};
