//! Server-rendered page handlers
//!
//! The HTML twin of the REST surface: login/logout, the create form, the
//! paginated listing, and delete-with-redirect. Notifications travel in a
//! short-lived flash cookie that is cleared on the next page render.

use axum::{
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use certdepot_auth::{JwtValidator, SessionClaims, SESSION_VALIDITY_HOURS};
use certdepot_db::entities::{certificate, user};
use certdepot_db::{search_certificates, CertificateFilter};
use certdepot_pki::CertificateRequestInput;

use crate::middleware::auth::cookie_value;
use crate::middleware::SESSION_COOKIE;
use crate::models::parse_expiration_form;
use crate::templates::{render_home, render_listing, render_login, ListingView, Notice};
use crate::AppState;

/// Page size of the HTML listing.
const PAGE_SIZE: u64 = 5;

const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateForm {
    pub filename: Option<String>,
    pub expiration: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub organization: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPageQuery {
    pub page: Option<u64>,
    pub search: Option<String>,
    pub date: Option<String>,
}

// ============================================================
// Flash cookie plumbing
// ============================================================

fn flash_set_header(notice: &Notice) -> Option<HeaderValue> {
    let encoded = urlencoding::encode(notice.message()).into_owned();
    HeaderValue::from_str(&format!(
        "{FLASH_COOKIE}={}:{}; Path=/; Max-Age=60; SameSite=Lax",
        notice.kind(),
        encoded
    ))
    .ok()
}

fn flash_clear_header() -> HeaderValue {
    HeaderValue::from_static("flash=; Path=/; Max-Age=0; SameSite=Lax")
}

/// Read the pending flash notice, if any. The caller clears the cookie
/// when rendering.
fn take_flash(headers: &HeaderMap) -> Vec<Notice> {
    let Some(raw) = cookie_value(headers, FLASH_COOKIE) else {
        return Vec::new();
    };
    let Some((kind, encoded)) = raw.split_once(':') else {
        return Vec::new();
    };
    let message = urlencoding::decode(encoded)
        .map(|m| m.into_owned())
        .unwrap_or_default();
    if message.is_empty() {
        return Vec::new();
    }
    match kind {
        "success" => vec![Notice::Success(message)],
        _ => vec![Notice::Error(message)],
    }
}

/// Render a page, clearing any flash cookie the notices came from.
fn render_page(markup: maud::Markup, clear_flash: bool) -> Response {
    let mut response = Html(markup.into_string()).into_response();
    if clear_flash {
        response
            .headers_mut()
            .append(header::SET_COOKIE, flash_clear_header());
    }
    response
}

fn redirect_with_flash(to: &str, notice: Notice) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Some(cookie) = flash_set_header(&notice) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

// ============================================================
// Session auth gate
// ============================================================

pub async fn login_page(headers: HeaderMap) -> Response {
    let notices = take_flash(&headers);
    render_page(render_login(&notices), !notices.is_empty())
}

pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let failed = || {
        render_page(
            render_login(&[Notice::Error("Invalid username or password.".to_string())]),
            false,
        )
    };

    let (Some(username), Some(password)) = (
        form.username.as_deref().map(str::trim).filter(|u| !u.is_empty()),
        form.password.as_deref(),
    ) else {
        return failed();
    };

    let found = match user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await
    {
        Ok(found) => found,
        Err(e) => {
            warn!("Database error during login: {}", e);
            return failed();
        }
    };

    let Some(account) = found else {
        return failed();
    };

    match certdepot_auth::verify_password(password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => return failed(),
        Err(e) => {
            warn!("Stored password hash rejected for {}: {}", username, e);
            return failed();
        }
    }

    let claims = SessionClaims::for_session(account.id.to_string(), account.username.clone());
    let token = match JwtValidator::encode(state.jwt_secret.as_bytes(), &claims) {
        Ok(token) => token,
        Err(e) => {
            warn!("Failed to issue session token: {}", e);
            return failed();
        }
    };

    info!(username = %account.username, "User logged in");

    let mut response = redirect_with_flash(
        "/",
        Notice::Success(format!("Welcome, {}!", account.username)),
    );
    let session_cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_VALIDITY_HOURS * 3600
    );
    if let Ok(cookie) = HeaderValue::from_str(&session_cookie) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

pub async fn logout() -> Response {
    let mut response = redirect_with_flash(
        "/accounts/login/",
        Notice::Success("You have been logged out.".to_string()),
    );
    response.headers_mut().append(
        header::SET_COOKIE,
        HeaderValue::from_static("session_token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
    );
    response
}

// ============================================================
// Certificate pages
// ============================================================

pub async fn home_page(headers: HeaderMap) -> Response {
    let notices = take_flash(&headers);
    render_page(render_home(&notices), !notices.is_empty())
}

pub async fn home_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CreateForm>,
) -> Response {
    let input = CertificateRequestInput {
        filename: form.filename,
        expiration: parse_expiration_form(form.expiration.as_deref()),
        password: form.password,
        password2: form.password2,
        full_name: form.full_name,
        department: form.department,
        organization: form.organization,
        city: form.city,
        region: form.region,
        country_code: form.country_code,
    };

    let request = match input.validate() {
        Ok(request) => request,
        Err(errors) => {
            let notices: Vec<Notice> = errors
                .iter_messages()
                .map(|(field, message)| Notice::Error(format!("{field}: {message}")))
                .collect();
            return render_page(render_home(&notices), false);
        }
    };

    let built = match tokio::task::spawn_blocking(move || certdepot_pki::build(&request)).await {
        Ok(Ok(built)) => built,
        Ok(Err(e)) => {
            warn!("Certificate construction failed: {}", e);
            return render_page(
                render_home(&[Notice::Error("Failed to build certificate.".to_string())]),
                false,
            );
        }
        Err(e) => {
            warn!("Certificate build task panicked: {}", e);
            return render_page(
                render_home(&[Notice::Error("Failed to build certificate.".to_string())]),
                false,
            );
        }
    };

    let record = certificate::ActiveModel {
        filename: Set(built.filename),
        payload: Set(built.payload),
        uploaded_at: Set(Utc::now()),
        ..Default::default()
    };

    match record.insert(&state.db).await {
        Ok(stored) => {
            info!(id = stored.id, filename = %stored.filename, "Certificate created");
            redirect_with_flash(
                "/",
                Notice::Success("Certificate created successfully!".to_string()),
            )
        }
        Err(e) => {
            warn!("Failed to store certificate: {}", e);
            render_page(
                render_home(&[Notice::Error("Failed to store certificate.".to_string())]),
                false,
            )
        }
    }
}

pub async fn list_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPageQuery>,
    headers: HeaderMap,
) -> Response {
    let notices = take_flash(&headers);
    let search = query.search.unwrap_or_default();
    let date = query.date.unwrap_or_default();

    let filter = CertificateFilter {
        search: Some(search.clone()),
        date: Some(date.clone()),
    };

    let listed = match search_certificates(&state.db, &filter, query.page.unwrap_or(1), PAGE_SIZE)
        .await
    {
        Ok(listed) => listed,
        Err(e) => {
            warn!("Database error while listing certificates: {}", e);
            return render_page(
                render_listing(
                    &ListingView {
                        records: &[],
                        current_page: 1,
                        total_pages: 1,
                        search: &search,
                        date: &date,
                    },
                    &[Notice::Error("Failed to load certificates.".to_string())],
                ),
                !notices.is_empty(),
            );
        }
    };

    let view = ListingView {
        records: &listed.records,
        current_page: listed.current_page,
        total_pages: listed.total_pages,
        search: &search,
        date: &date,
    };
    render_page(render_listing(&view, &notices), !notices.is_empty())
}

pub async fn delete_page(State(state): State<Arc<AppState>>, Path(id): Path<i32>) -> Response {
    match certificate::Entity::delete_by_id(id).exec(&state.db).await {
        Ok(res) if res.rows_affected > 0 => {
            info!(id, "Certificate deleted");
            redirect_with_flash("/detail/", Notice::Success("File deleted.".to_string()))
        }
        Ok(_) => redirect_with_flash("/detail/", Notice::Error("File not found.".to_string())),
        Err(e) => {
            warn!("Failed to delete certificate {}: {}", id, e);
            redirect_with_flash(
                "/detail/",
                Notice::Error("Failed to delete the file.".to_string()),
            )
        }
    }
}
