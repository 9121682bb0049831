//! Wire models for the REST surface

use certdepot_pki::{CertificateRequestInput, ExpirationInput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Plain success message, e.g. `{"message": "Certificate created"}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Plain error message, e.g. `{"error": "File not found"}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Stored certificate metadata plus its download URL
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateSummary {
    /// Record id
    pub id: i32,
    /// Stored filename, e.g. "25AB_asan.asanov.p12"
    pub filename: String,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
    /// Download URL for the archive bytes
    pub file: String,
}

impl CertificateSummary {
    pub fn from_record(record: certdepot_db::entities::certificate::Model) -> Self {
        Self {
            file: download_url(record.id),
            id: record.id,
            filename: record.filename,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Paginated listing envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateListResponse {
    /// Total matching records (all pages)
    pub count: u64,
    /// URL of the next page, if any
    pub next: Option<String>,
    /// URL of the previous page, if any
    pub previous: Option<String>,
    pub results: Vec<CertificateSummary>,
}

/// Query parameters accepted by the listing endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Filename search; `-`, `_`, `.` are treated as spaces
    pub search: Option<String>,
    /// Upload date filter, `YYYY-MM-DD`
    pub date: Option<String>,
    /// 1-based page number (out-of-range values clamp)
    pub page: Option<u64>,
    /// Records per page (default 10, max 100)
    pub page_size: Option<u64>,
}

/// Body of `POST /api/create/`. Accepted as a loose JSON object so that
/// missing or mistyped fields come back as field-keyed validation errors
/// rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCertificateBody {
    /// Certificate file name, without extension
    #[schema(example = "my_certificate")]
    pub filename: Option<String>,
    /// Validity in days, 1-365
    #[schema(example = 365)]
    pub expiration: Option<i64>,
    /// Archive password (write-only)
    #[schema(example = "secret123")]
    pub password: Option<String>,
    /// Password confirmation
    #[schema(example = "secret123")]
    pub password2: Option<String>,
    #[schema(example = "John Doe")]
    pub full_name: Option<String>,
    #[schema(example = "IT Department")]
    pub department: Option<String>,
    #[schema(example = "MyCompany")]
    pub organization: Option<String>,
    #[schema(example = "Bishkek")]
    pub city: Option<String>,
    #[schema(example = "Chuy")]
    pub region: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    #[schema(example = "KG")]
    pub country_code: Option<String>,
}

/// Health probe response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Download URL for a stored record.
pub fn download_url(id: i32) -> String {
    format!("/api/download/{id}/")
}

/// Map a JSON object onto the builder's input type. Absent, null, and
/// wrong-typed string fields all count as missing; `expiration` accepts
/// an integer or an integer-valued string (anything else is reported as
/// "a valid integer is required" by validation).
pub fn certificate_input_from_json(body: &Value) -> CertificateRequestInput {
    fn string_field(body: &Value, key: &str) -> Option<String> {
        body.get(key).and_then(Value::as_str).map(str::to_string)
    }

    let expiration = match body.get("expiration") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(
            n.as_i64()
                .map_or(ExpirationInput::Invalid, ExpirationInput::Value),
        ),
        Some(Value::String(s)) => Some(parse_expiration_str(s)),
        Some(_) => Some(ExpirationInput::Invalid),
    };

    CertificateRequestInput {
        filename: string_field(body, "filename"),
        expiration,
        password: string_field(body, "password"),
        password2: string_field(body, "password2"),
        full_name: string_field(body, "full_name"),
        department: string_field(body, "department"),
        organization: string_field(body, "organization"),
        city: string_field(body, "city"),
        region: string_field(body, "region"),
        country_code: string_field(body, "country_code"),
    }
}

/// Parse an `expiration` form value; blank counts as missing.
pub fn parse_expiration_form(value: Option<&str>) -> Option<ExpirationInput> {
    let trimmed = value.map(str::trim).filter(|v| !v.is_empty())?;
    Some(parse_expiration_str(trimmed))
}

fn parse_expiration_str(value: &str) -> ExpirationInput {
    value
        .trim()
        .parse::<i64>()
        .map_or(ExpirationInput::Invalid, ExpirationInput::Value)
}
