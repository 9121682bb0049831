//! Listing queries over stored certificates
//!
//! Shared by the HTML list page and the REST listing endpoint so both
//! surfaces filter, order, and paginate identically.

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::entities::certificate::{self, Column};
use crate::entities::Certificate;

/// Filter parameters accepted by the listing endpoints.
#[derive(Debug, Clone, Default)]
pub struct CertificateFilter {
    /// Free-text filename search; separators (`-`, `_`, `.`) are tolerated.
    pub search: Option<String>,
    /// Upload date as `YYYY-MM-DD`; unparseable values are ignored.
    pub date: Option<String>,
}

/// One page of certificate records plus pagination metadata.
#[derive(Debug, Clone)]
pub struct CertificatePage {
    pub records: Vec<certificate::Model>,
    /// 1-based page number actually served (out-of-range requests clamp).
    pub current_page: u64,
    /// Total pages; at least 1 even for an empty result set.
    pub total_pages: u64,
    pub total_count: u64,
}

/// Lowercase `raw` and replace the separator characters `-`, `_`, `.`
/// with spaces, so "asan.ov", "asan_ov" and "asan-ov" all normalize to
/// "asan ov".
pub fn normalize_search(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '-' | '_' | '.' => ' ',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// SQL expression applying [`normalize_search`] to the filename column:
/// `REPLACE(REPLACE(REPLACE(LOWER(filename), '-', ' '), '_', ' '), '.', ' ')`.
fn normalized_filename() -> SimpleExpr {
    let mut expr: SimpleExpr = Func::lower(Expr::col(Column::Filename)).into();
    for sep in ["-", "_", "."] {
        expr = Func::cust(Alias::new("REPLACE"))
            .arg(expr)
            .arg(Expr::val(sep))
            .arg(Expr::val(" "))
            .into();
    }
    expr
}

fn build_condition(filter: &CertificateFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            let raw_pattern = format!("%{}%", search.to_lowercase());
            let normalized_pattern = format!("%{}%", normalize_search(search));
            condition = condition.add(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(Column::Filename))).like(raw_pattern))
                    .add(Expr::expr(normalized_filename()).like(normalized_pattern)),
            );
        }
    }

    if let Some(date) = filter.date.as_deref().map(str::trim) {
        if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
            let end = start + Duration::days(1);
            condition = condition
                .add(Column::UploadedAt.gte(start))
                .add(Column::UploadedAt.lt(end));
        }
    }

    condition
}

/// Run the filtered listing query: most recent first (ties broken by
/// insertion order), paginated with out-of-range page numbers clamped to
/// the last non-empty page.
pub async fn search_certificates(
    db: &DatabaseConnection,
    filter: &CertificateFilter,
    page: u64,
    page_size: u64,
) -> Result<CertificatePage, DbErr> {
    let page_size = page_size.max(1);

    let paginator = Certificate::find()
        .filter(build_condition(filter))
        .order_by_desc(Column::UploadedAt)
        .order_by_asc(Column::Id)
        .paginate(db, page_size);

    let total_count = paginator.num_items().await?;
    let total_pages = total_count.div_ceil(page_size).max(1);
    let current_page = page.clamp(1, total_pages);

    let records = paginator.fetch_page(current_page - 1).await?;

    Ok(CertificatePage {
        records,
        current_page,
        total_pages,
        total_count,
    })
}
