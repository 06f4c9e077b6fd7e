//! Session cookie plumbing and the current-caller extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use crate::accounts::repo::{Account, Session};
use crate::flash::cookie_value;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/accounts/login/";

pub fn session_cookie(name: &str, token: &str, ttl_minutes: i64) -> String {
    format!(
        "{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl_minutes * 60
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// The authenticated caller, resolved from the session cookie.
///
/// Always an explicit handler argument threaded into repository calls,
/// never ambient state. Use `Option<CurrentUser>` on pages that merely
/// shortcut already-authenticated visitors.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account: Account,
    pub token: String,
}

/// Rejection: unauthenticated callers are sent to the login page.
pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| cookie_value(h, &state.config.session.cookie_name))
            .ok_or(LoginRedirect)?;

        match Session::find_account(&state.db, &token).await {
            Ok(Some(account)) => Ok(CurrentUser { account, token }),
            Ok(None) => Err(LoginRedirect),
            Err(e) => {
                tracing::error!(error = %e, "session lookup failed");
                Err(LoginRedirect)
            }
        }
    }
}
