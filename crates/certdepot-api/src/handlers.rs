//! REST API handlers
//!
//! JSON/binary mirror of the HTML pages: create, list, detail, download,
//! and delete operations over stored certificates, all gated by the auth
//! middleware except the health probe.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::Arc;
use tracing::{debug, info, warn};

use certdepot_db::entities::certificate;
use certdepot_db::{search_certificates, CertificateFilter};

use crate::models::*;
use crate::AppState;

/// Maximum `page_size` the listing endpoint will serve.
const MAX_PAGE_SIZE: u64 = 100;

/// Create a certificate
#[utoipa::path(
    post,
    path = "/api/create/",
    request_body = CreateCertificateBody,
    responses(
        (status = 201, description = "Certificate created and stored", body = MessageResponse),
        (status = 400, description = "Validation errors keyed by field"),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "certificates"
)]
pub async fn create_certificate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let input = certificate_input_from_json(&body);

    let request = match input.validate() {
        Ok(request) => request,
        Err(errors) => {
            debug!("Rejecting certificate request: {}", errors);
            return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
        }
    };

    // RSA key generation takes real CPU time; keep it off the async runtime.
    let built = match tokio::task::spawn_blocking(move || certdepot_pki::build(&request)).await {
        Ok(Ok(built)) => built,
        Ok(Err(e)) => {
            warn!("Certificate construction failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("Failed to build certificate")),
            )
                .into_response();
        }
        Err(e) => {
            warn!("Certificate build task panicked: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("Failed to build certificate")),
            )
                .into_response();
        }
    };

    let record = certificate::ActiveModel {
        filename: Set(built.filename.clone()),
        payload: Set(built.payload),
        uploaded_at: Set(Utc::now()),
        ..Default::default()
    };

    match record.insert(&state.db).await {
        Ok(stored) => {
            info!(id = stored.id, filename = %stored.filename, "Certificate created");
            (
                StatusCode::CREATED,
                Json(MessageResponse {
                    message: "Certificate created".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Failed to store certificate: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("Failed to store certificate")),
            )
                .into_response()
        }
    }
}

/// Delete a certificate by id
#[utoipa::path(
    delete,
    path = "/api/delete/{id}",
    params(("id" = i32, Path, description = "Certificate id")),
    responses(
        (status = 204, description = "Certificate deleted", body = MessageResponse),
        (status = 404, description = "Certificate not found", body = ApiError),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "certificates"
)]
pub async fn delete_certificate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Response {
    let found = match certificate::Entity::find_by_id(id).one(&state.db).await {
        Ok(found) => found,
        Err(e) => return database_error(e),
    };

    let Some(record) = found else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("Certificate not found!")),
        )
            .into_response();
    };

    if let Err(e) = certificate::Entity::delete_by_id(record.id)
        .exec(&state.db)
        .await
    {
        return database_error(e);
    }

    info!(id, "Certificate deleted");
    (
        StatusCode::NO_CONTENT,
        Json(MessageResponse {
            message: "Certificate deleted!".to_string(),
        }),
    )
        .into_response()
}

/// List certificates
#[utoipa::path(
    get,
    path = "/api/listing/",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated certificate listing", body = CertificateListResponse),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "certificates"
)]
pub async fn list_certificates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    debug!("Listing certificates with filters: {:?}", query);

    let filter = CertificateFilter {
        search: query.search.clone(),
        date: query.date.clone(),
    };
    let page = query.page.unwrap_or(1);
    let page_size = query
        .page_size
        .unwrap_or(state.api_page_size)
        .clamp(1, MAX_PAGE_SIZE);

    let listed = match search_certificates(&state.db, &filter, page, page_size).await {
        Ok(listed) => listed,
        Err(e) => return database_error(e),
    };

    let next = (listed.current_page < listed.total_pages)
        .then(|| listing_url(&query, listed.current_page + 1));
    let previous = (listed.current_page > 1).then(|| listing_url(&query, listed.current_page - 1));

    let results = listed
        .records
        .into_iter()
        .map(CertificateSummary::from_record)
        .collect();

    Json(CertificateListResponse {
        count: listed.total_count,
        next,
        previous,
        results,
    })
    .into_response()
}

/// Get certificate metadata by id
#[utoipa::path(
    get,
    path = "/api/listing/{id}/",
    params(("id" = i32, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "Certificate metadata", body = CertificateSummary),
        (status = 404, description = "Certificate not found", body = ApiError),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "certificates"
)]
pub async fn get_certificate(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> Response {
    match certificate::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(record)) => Json(CertificateSummary::from_record(record)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("File not found")),
        )
            .into_response(),
        Err(e) => database_error(e),
    }
}

/// Download the stored archive bytes
#[utoipa::path(
    get,
    path = "/api/download/{id}/",
    params(("id" = i32, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "PKCS#12 archive as an attachment", content_type = "application/octet-stream"),
        (status = 404, description = "Certificate not found", body = ApiError),
        (status = 401, description = "Missing or invalid session token", body = ApiError)
    ),
    tag = "certificates"
)]
pub async fn download_certificate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Response {
    let record = match certificate::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiError::new("File not found")),
            )
                .into_response()
        }
        Err(e) => return database_error(e),
    };

    debug!(id, filename = %record.filename, "Serving certificate download");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        record.filename.replace(['"', '\r', '\n'], "")
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        record.payload,
    )
        .into_response()
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Rebuild the listing URL for a neighboring page, preserving filters.
fn listing_url(query: &ListQuery, page: u64) -> String {
    let mut params = vec![format!("page={page}")];
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        params.push(format!("search={}", urlencoding::encode(search)));
    }
    if let Some(date) = query.date.as_deref().filter(|d| !d.is_empty()) {
        params.push(format!("date={}", urlencoding::encode(date)));
    }
    if let Some(page_size) = query.page_size {
        params.push(format!("page_size={page_size}"));
    }
    format!("/api/listing/?{}", params.join("&"))
}

fn database_error(e: sea_orm::DbErr) -> Response {
    warn!("Database error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new("Database error")),
    )
        .into_response()
}
