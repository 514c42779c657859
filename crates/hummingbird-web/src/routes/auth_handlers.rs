use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;

use crate::auth::middleware::{expired_session_cookie, session_cookie};
use crate::dto::{LoginForm, LogoutQuery};
use crate::error::AppError;
use crate::state::AppState;
use crate::static_files;

pub async fn login_page() -> Response {
    static_files::page("login.html")
}

/// Verifies the shared password. Success sets the session cookie; failure
/// is answered only after the configured delay to slow down guessing.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let valid = match &state.verifier {
        Some(verifier) => {
            let verifier = Arc::clone(verifier);
            let password = form.password;
            tokio::task::spawn_blocking(move || verifier.verify(&password))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?
        }
        None => false,
    };

    if !valid {
        tracing::warn!("Failed login attempt: invalid password");
        tokio::time::sleep(state.config.auth.failed_login_delay()).await;
        return Ok((jar, Redirect::to("/login?error")));
    }

    let token = state.issuer.issue()?;
    tracing::info!("Password verified, session issued");

    let cookie = session_cookie(token.into_string(), state.config.tls_enabled());
    Ok((jar.add(cookie), Redirect::to("/")))
}

pub async fn logout(jar: CookieJar, Query(query): Query<LogoutQuery>) -> (CookieJar, Redirect) {
    let target = query.redirect_target().to_string();
    (jar.remove(expired_session_cookie()), Redirect::to(&target))
}
