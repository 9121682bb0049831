//! Session authentication middleware
//!
//! Extracts the session JWT from the `session_token` cookie (browsers)
//! or an `Authorization: Bearer` header (API clients), validates it, and
//! injects the user context into request extensions. The API variant
//! answers 401 JSON; the page variant redirects to the login form.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use certdepot_auth::JwtValidator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::ApiError;

/// Cookie carrying the session JWT.
pub const SESSION_COOKIE: &str = "session_token";

/// Authenticated user context extracted from the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// User id (UUID string)
    pub user_id: String,
    /// Login name
    pub username: String,
}

/// JWT validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub validator: Arc<JwtValidator>,
}

impl JwtState {
    /// Create new JWT state with the given secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            validator: Arc::new(JwtValidator::new(secret)),
        }
    }
}

/// Pull the session token from the cookie (preferred) or the
/// Authorization header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, SESSION_COOKIE) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Read a single cookie out of the Cookie header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
        .map(str::to_string)
}

fn validate(state: &JwtState, headers: &HeaderMap) -> Result<AuthUser, String> {
    let token = extract_token(headers)
        .ok_or_else(|| "Missing authentication token (cookie or Authorization header)".to_string())?;

    let claims = state
        .validator
        .validate(&token)
        .map_err(|e| e.to_string())?;

    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
    })
}

/// Authentication middleware for the REST surface: 401 JSON on failure.
pub async fn require_auth(
    state: axum::extract::State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    match validate(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(reason) => {
            tracing::debug!("Rejecting unauthenticated API request: {}", reason);
            Err((StatusCode::UNAUTHORIZED, Json(ApiError { error: reason })))
        }
    }
}

/// Authentication middleware for the HTML surface: redirect to the login
/// page on failure.
pub async fn require_auth_page(
    state: axum::extract::State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match validate(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(_) => Redirect::to("/accounts/login/").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use certdepot_auth::SessionClaims;
    use tower::ServiceExt; // For oneshot()

    const SECRET: &[u8] = b"test-secret-key";

    async fn protected_handler(axum::Extension(user): axum::Extension<AuthUser>) -> Json<AuthUser> {
        Json(user)
    }

    fn api_app() -> Router {
        let jwt_state = Arc::new(JwtState::new(SECRET));

        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(jwt_state, require_auth))
    }

    fn page_app() -> Router {
        let jwt_state = Arc::new(JwtState::new(SECRET));

        Router::new()
            .route("/", get(protected_handler))
            .layer(middleware::from_fn_with_state(jwt_state, require_auth_page))
    }

    fn session_token() -> String {
        let claims =
            SessionClaims::for_session("user-uuid-123".to_string(), "alice".to_string());
        JwtValidator::encode(SECRET, &claims).unwrap()
    }

    #[tokio::test]
    async fn test_bearer_token_is_accepted() {
        let response = api_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", format!("Bearer {}", session_token()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let user: AuthUser = serde_json::from_slice(&body).unwrap();
        assert_eq!(user.user_id, "user-uuid-123");
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_session_cookie_is_accepted() {
        let response = api_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Cookie", format!("other=1; session_token={}", session_token()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_yields_401() {
        let response = api_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert!(error.error.contains("Missing authentication token"));
    }

    #[tokio::test]
    async fn test_tampered_token_yields_401() {
        let claims =
            SessionClaims::for_session("user-uuid-123".to_string(), "alice".to_string());
        let token = JwtValidator::encode(b"another-secret", &claims).unwrap();

        let response = api_app()
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_page_surface_redirects_to_login() {
        let response = page_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/accounts/login/"
        );
    }
}
