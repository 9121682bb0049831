//! Maud HTML templates for the server-rendered pages

use maud::{html, Markup, PreEscaped, DOCTYPE};

use certdepot_db::entities::certificate;

/// A flash-style notification shown at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::Success(_) => "success",
            Notice::Error(_) => "error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(message) | Notice::Error(message) => message,
        }
    }
}

pub fn render_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style {
                    (PreEscaped(r#"
                        body { font-family: system-ui; max-width: 800px; margin: 50px auto; padding: 20px; background: #f1f3f5; color: #212529; }
                        .container { background: #ffffff; padding: 30px; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); border: 1px solid #dee2e6; }
                        h1 { font-weight: 600; margin-bottom: 20px; }
                        label { display: block; margin: 12px 0 4px; font-weight: 600; }
                        input { width: 100%; padding: 8px; box-sizing: border-box; border: 1px solid #495057; border-radius: 4px; }
                        button { background: #0056b3; color: #ffffff; padding: 10px 22px; border: none; border-radius: 4px; cursor: pointer; margin-top: 14px; font-weight: 600; }
                        button:hover { background: #003d82; }
                        table { width: 100%; border-collapse: collapse; margin-top: 16px; }
                        th, td { text-align: left; padding: 8px; border-bottom: 1px solid #dee2e6; }
                        nav.top a { margin-right: 14px; }
                        .messages div { padding: 10px 14px; border-radius: 4px; margin-bottom: 8px; }
                        .messages .success { background: #d4edda; color: #155724; }
                        .messages .error { background: #f8d7da; color: #721c24; }
                        .pager { margin-top: 16px; }
                        .pager a { margin-right: 10px; }
                        .filters input { width: auto; margin-right: 8px; }
                    "#))
                }
            }
            body {
                div class="container" {
                    (content)
                }
            }
        }
    }
}

fn render_notices(notices: &[Notice]) -> Markup {
    html! {
        @if !notices.is_empty() {
            div class="messages" {
                @for notice in notices {
                    div class=(notice.kind()) { (notice.message()) }
                }
            }
        }
    }
}

pub fn render_login(notices: &[Notice]) -> Markup {
    render_layout(
        "Log in - CertDepot",
        html! {
            h1 { "Log in" }
            (render_notices(notices))
            form method="post" action="/accounts/login/" {
                label for="username" { "Username" }
                input type="text" id="username" name="username" autofocus;
                label for="password" { "Password" }
                input type="password" id="password" name="password";
                button type="submit" { "Log in" }
            }
        },
    )
}

pub fn render_home(notices: &[Notice]) -> Markup {
    render_layout(
        "Create certificate - CertDepot",
        html! {
            nav class="top" {
                a href="/" { "Create" }
                a href="/detail/" { "Certificates" }
                a href="/accounts/logout/" { "Log out" }
            }
            h1 { "Create certificate" }
            (render_notices(notices))
            form method="post" action="/" {
                label for="filename" { "File name (without extension)" }
                input type="text" id="filename" name="filename";
                label for="expiration" { "Expiration (days, 1-365)" }
                input type="number" id="expiration" name="expiration" min="1" max="365";
                label for="password" { "Password" }
                input type="password" id="password" name="password";
                label for="password2" { "Confirm password" }
                input type="password" id="password2" name="password2";
                label for="full_name" { "Full name" }
                input type="text" id="full_name" name="full_name";
                label for="department" { "Department" }
                input type="text" id="department" name="department";
                label for="organization" { "Organization" }
                input type="text" id="organization" name="organization";
                label for="city" { "City" }
                input type="text" id="city" name="city";
                label for="region" { "Region" }
                input type="text" id="region" name="region";
                label for="country_code" { "Country code (two letters)" }
                input type="text" id="country_code" name="country_code" maxlength="2";
                button type="submit" { "Create" }
            }
        },
    )
}

pub struct ListingView<'a> {
    pub records: &'a [certificate::Model],
    pub current_page: u64,
    pub total_pages: u64,
    pub search: &'a str,
    pub date: &'a str,
}

fn listing_page_url(view: &ListingView<'_>, page: u64) -> String {
    let mut url = format!("/detail/?page={page}");
    if !view.search.is_empty() {
        url.push_str(&format!("&search={}", urlencoding::encode(view.search)));
    }
    if !view.date.is_empty() {
        url.push_str(&format!("&date={}", urlencoding::encode(view.date)));
    }
    url
}

pub fn render_listing(view: &ListingView<'_>, notices: &[Notice]) -> Markup {
    render_layout(
        "Certificates - CertDepot",
        html! {
            nav class="top" {
                a href="/" { "Create" }
                a href="/detail/" { "Certificates" }
                a href="/accounts/logout/" { "Log out" }
            }
            h1 { "Certificates" }
            (render_notices(notices))
            form class="filters" method="get" action="/detail/" {
                input type="text" name="search" placeholder="Search by file name" value=(view.search);
                input type="date" name="date" value=(view.date);
                button type="submit" { "Filter" }
            }
            @if view.records.is_empty() {
                p { "No certificates found." }
            } @else {
                table {
                    tr {
                        th { "File name" }
                        th { "Uploaded at" }
                        th { }
                        th { }
                    }
                    @for record in view.records {
                        tr {
                            td { (record.filename) }
                            td { (record.uploaded_at.format("%Y-%m-%d %H:%M:%S")) }
                            td {
                                a href=(format!("/api/download/{}/", record.id)) { "Download" }
                            }
                            td {
                                a href=(format!("/delete/{}/", record.id)) { "Delete" }
                            }
                        }
                    }
                }
            }
            div class="pager" {
                @if view.current_page > 1 {
                    a href=(listing_page_url(view, view.current_page - 1)) { "Previous" }
                }
                span { "Page " (view.current_page) " of " (view.total_pages) }
                @if view.current_page < view.total_pages {
                    a href=(listing_page_url(view, view.current_page + 1)) { "Next" }
                }
            }
        },
    )
}
