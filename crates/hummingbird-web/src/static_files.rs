use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use rust_embed::Embed;

use crate::error::AppError;

#[derive(Embed)]
#[folder = "web/"]
struct Assets;

/// Serves an embedded HTML page.
pub fn page(name: &str) -> Response {
    match Assets::get(name) {
        Some(content) => Html(String::from_utf8_lossy(&content.data).into_owned()).into_response(),
        None => AppError::Internal(format!("embedded page missing: {name}")).into_response(),
    }
}

/// `GET /static/{*path}`: scripts and styles used by the pages.
pub async fn static_handler(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    if let Some(content) = Assets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime.as_ref())],
            content.data.into_owned(),
        )
            .into_response()
    } else {
        AppError::NotFound(format!("No such asset: {path}")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_embedded() {
        for name in ["index.html", "login.html", "app.js", "login.js", "style.css"] {
            assert!(Assets::get(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn page_serves_html() {
        let response = page("login.html");
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[test]
    fn missing_page_is_internal_error() {
        assert_eq!(page("nope.html").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn static_handler_sets_mime() {
        let response = static_handler(Path("app.js".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"));
    }

    #[tokio::test]
    async fn static_handler_unknown_asset() {
        let response = static_handler(Path("missing.js".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
