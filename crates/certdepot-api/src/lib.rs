//! HTTP surface for CertDepot
//!
//! One axum router serving both renderings of the application: the JSON
//! REST API under `/api/` (documented via OpenAPI/Swagger) and the
//! server-rendered HTML pages, both backed by the same store and gated
//! by the same session tokens.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod templates;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    /// Default page size of the REST listing endpoint
    pub api_page_size: u64,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Certificate API",
        version = "0.1.0",
        description = "API for managing .p12 certificates: create, list, download, delete",
        contact(email = "support@certdepot.io"),
        license(name = "MIT License")
    ),
    paths(
        handlers::create_certificate,
        handlers::delete_certificate,
        handlers::list_certificates,
        handlers::get_certificate,
        handlers::download_certificate,
        handlers::health_check,
    ),
    components(
        schemas(
            models::MessageResponse,
            models::ApiError,
            models::CertificateSummary,
            models::CertificateListResponse,
            models::CreateCertificateBody,
            models::HealthResponse,
        )
    ),
    tags(
        (name = "certificates", description = "Certificate management endpoints"),
        (name = "system", description = "System health endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development against a separate frontend)
    pub enable_cors: bool,
    /// Secret for signing session tokens; the binary always supplies one
    pub jwt_secret: String,
    /// Default page size of the REST listing endpoint
    pub api_page_size: u64,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".parse().expect("static address parses"),
            enable_cors: true,
            jwt_secret: "insecure-dev-secret".to_string(),
            api_page_size: 10,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new server over an already-migrated database connection
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let state = Arc::new(AppState {
            db,
            jwt_secret: config.jwt_secret.clone(),
            api_page_size: config.api_page_size,
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let jwt_state = Arc::new(middleware::JwtState::new(self.config.jwt_secret.as_bytes()));

        // PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route(
                "/accounts/login/",
                get(pages::login_page).post(pages::login_submit),
            )
            .route("/accounts/logout/", get(pages::logout))
            .with_state(self.state.clone());

        // PROTECTED API routes: 401 without a valid session token
        let protected_api = Router::new()
            .route("/api/create/", post(handlers::create_certificate))
            .route("/api/delete/{id}", delete(handlers::delete_certificate))
            .route("/api/listing/", get(handlers::list_certificates))
            .route("/api/listing/{id}/", get(handlers::get_certificate))
            .route("/api/download/{id}/", get(handlers::download_certificate))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state.clone(),
                middleware::require_auth,
            ));

        // PROTECTED pages: redirect to the login form instead of 401
        let protected_pages = Router::new()
            .route("/", get(pages::home_page).post(pages::home_submit))
            .route("/detail/", get(pages::list_page))
            .route("/delete/{id}/", get(pages::delete_page))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state,
                middleware::require_auth_page,
            ));

        // SwaggerUi also serves /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(public_router)
            .merge(protected_api)
            .merge(protected_pages);

        let mut router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            use tower_http::cors::AllowOrigin;

            // Cookie auth needs credentials, which rules out allow_origin(Any);
            // only local development origins are accepted.
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    let origin = origin.to_str().unwrap_or("");
                    origin.starts_with("http://localhost:")
                        || origin.starts_with("http://127.0.0.1:")
                }));
            router = router.layer(cors);
        }

        router
    }

    /// Start the server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let bind_addr = self.config.bind_addr;
        let router = self.build_router();

        info!("Starting CertDepot server on {}", bind_addr);
        info!("OpenAPI spec: http://{}/api/openapi.json", bind_addr);
        info!("Swagger UI: http://{}/swagger-ui", bind_addr);

        let listener = tokio::net::TcpListener::bind(bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        // Ensure OpenAPI spec can be generated without panics
        let _api_doc = ApiDoc::openapi();
    }
}
