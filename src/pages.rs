//! Minimal HTML shell for the portal's page routes.
//!
//! The real pages are rendered by the portal frontend; this shell only makes
//! the routes reachable so the gatekeeper has something to guard.

use axum::{
    Router,
    http::Uri,
    response::Html,
    routing::get,
};

use crate::session::Session;

/// Page routes served by the shell.
pub fn router() -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/dashboard", get(page_handler))
        .route("/dashboard/{*path}", get(page_handler))
        .route("/flight", get(page_handler))
        .route("/flight/{*path}", get(page_handler))
        .route("/profile", get(page_handler))
        .route("/users", get(page_handler))
        .route("/users/{*path}", get(page_handler))
        .route("/reports", get(page_handler))
        .route("/reports/{*path}", get(page_handler))
        .route("/auth/signin", get(page_handler))
        .route("/auth/signup", get(page_handler))
}

async fn page_handler(uri: Uri, Session(session): Session) -> Html<String> {
    let status = match session.email() {
        Some(email) => format!("Signed in as {}", escape_html(email)),
        None => "Not signed in".to_string(),
    };
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>SkyPortal</title></head>\
         <body data-path=\"{}\"><main id=\"app\"></main><footer>{}</footer></body></html>\n",
        escape_html(uri.path()),
        status
    ))
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
