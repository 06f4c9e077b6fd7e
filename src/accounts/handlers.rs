use axum::{
    extract::{Form, State},
    http::header::{HeaderValue, SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    accounts::{
        dto::{LoginForm, RegisterForm},
        repo::{Account, AccountError, Session},
        services::{self, hash_password, verify_password, FieldErrors},
        sessions::{clear_session_cookie, session_cookie, CurrentUser},
    },
    error::AppError,
    flash::{FlashRedirect, IncomingNotices, Notice},
    render::Page,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/register/", get(register_form).post(register))
        .route("/accounts/login/", get(login_form).post(login))
        .route("/accounts/logout/", get(logout).post(logout))
}

fn append_cookie(res: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        res.headers_mut().append(SET_COOKIE, value);
    }
}

#[instrument(skip(user, notices))]
pub async fn register_form(user: Option<CurrentUser>, notices: IncomingNotices) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard/").into_response();
    }
    Page::new("accounts/register.html")
        .notices(notices)
        .into_response()
}

fn register_page(username: &str, email: &str, errors: &FieldErrors) -> Page {
    Page::new("accounts/register.html")
        .context("form", json!({ "username": username, "email": email }))
        .context("errors", json!(errors))
        .notice(Notice::error("Please correct the errors below."))
}

#[instrument(skip(state, user, form))]
pub async fn register(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/dashboard/").into_response());
    }

    let username = form.username.trim().to_string();
    let email = form.email.trim().to_lowercase();

    let mut errors = services::validate_register(&form);

    if errors.is_empty() {
        if Account::find_by_username(&state.db, &username).await?.is_some() {
            errors.insert("username", "This username is already taken.".into());
        }
        if Account::find_by_email(&state.db, &email).await?.is_some() {
            errors.insert("email", "This email is already registered.".into());
        }
    }

    if !errors.is_empty() {
        warn!(username = %username, "registration rejected");
        return Ok(register_page(&username, &email, &errors).into_response());
    }

    let hash = hash_password(&form.password)?;

    let account = match Account::create(&state.db, &username, &email, &hash).await {
        Ok(a) => a,
        // the insert can still lose the race against a concurrent registration
        Err(AccountError::UsernameTaken) => {
            errors.insert("username", "This username is already taken.".into());
            return Ok(register_page(&username, &email, &errors).into_response());
        }
        Err(AccountError::EmailTaken) => {
            errors.insert("email", "This email is already registered.".into());
            return Ok(register_page(&username, &email, &errors).into_response());
        }
        Err(AccountError::Database(e)) => return Err(e.into()),
    };

    // auto-login after registration
    let session = Session::create(&state.db, account.id, state.config.session.ttl_minutes).await?;

    info!(account_id = %account.id, username = %account.username, "account registered");

    let mut res = FlashRedirect::to("/dashboard/")
        .notice(Notice::success(format!(
            "Welcome {}! Your account has been created.",
            account.username
        )))
        .into_response();
    append_cookie(
        &mut res,
        &session_cookie(
            &state.config.session.cookie_name,
            &session.token,
            state.config.session.ttl_minutes,
        ),
    );
    Ok(res)
}

#[instrument(skip(user, notices))]
pub async fn login_form(user: Option<CurrentUser>, notices: IncomingNotices) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard/").into_response();
    }
    Page::new("accounts/login.html")
        .notices(notices)
        .into_response()
}

/// Unknown username and wrong password share one message so the response
/// never confirms which usernames exist.
fn invalid_credentials(username: &str) -> Page {
    Page::new("accounts/login.html")
        .context("form", json!({ "username": username }))
        .notice(Notice::error("Invalid username or password."))
}

#[instrument(skip(state, user, form))]
pub async fn login(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/dashboard/").into_response());
    }

    let username = form.username.trim();

    let account = match Account::find_by_username(&state.db, username).await? {
        Some(a) => a,
        None => {
            warn!(username = %username, "login with unknown username");
            return Ok(invalid_credentials(username).into_response());
        }
    };

    if !verify_password(&form.password, &account.password_hash)? {
        warn!(account_id = %account.id, "login with invalid password");
        return Ok(invalid_credentials(username).into_response());
    }

    let session = Session::create(&state.db, account.id, state.config.session.ttl_minutes).await?;

    info!(account_id = %account.id, username = %account.username, "logged in");

    let mut res = FlashRedirect::to("/dashboard/")
        .notice(Notice::success(format!(
            "Welcome back, {}!",
            account.username
        )))
        .into_response();
    append_cookie(
        &mut res,
        &session_cookie(
            &state.config.session.cookie_name,
            &session.token,
            state.config.session.ttl_minutes,
        ),
    );
    Ok(res)
}

#[instrument(skip(state, user))]
pub async fn logout(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    if let Some(user) = &user {
        Session::delete(&state.db, &user.token).await?;
        info!(account_id = %user.account.id, "logged out");
    }

    let mut res = FlashRedirect::to("/")
        .notice(Notice::info("You have been logged out successfully."))
        .into_response();
    append_cookie(
        &mut res,
        &clear_session_cookie(&state.config.session.cookie_name),
    );
    Ok(res)
}
