use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "hummingbird_session";

/// Returns `true` if the jar carries a session token this server signed.
pub fn has_valid_session(state: &AppState, jar: &CookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|cookie| state.issuer.validate(cookie.value()))
}

fn session_satisfied(parts: &Parts, state: &AppState) -> bool {
    // Login disabled: everyone is let through.
    if !state.config.auth.require_login {
        return true;
    }
    has_valid_session(state, &CookieJar::from_headers(&parts.headers))
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Gate for HTML pages: sends the browser to `/login` without a session.
pub struct PageSession;

impl FromRequestParts<AppState> for PageSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if session_satisfied(parts, state) {
            Ok(PageSession)
        } else {
            Err(Redirect::to("/login"))
        }
    }
}

/// Gate for the WebSocket upgrade: a browser cannot follow a redirect there,
/// so a missing session is a plain 401.
pub struct SocketSession;

impl FromRequestParts<AppState> for SocketSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if session_satisfied(parts, state) {
            Ok(SocketSession)
        } else {
            tracing::warn!("Rejected WebSocket upgrade without a valid session");
            Err(AppError::Unauthorized("Invalid or missing session".to_string()))
        }
    }
}
