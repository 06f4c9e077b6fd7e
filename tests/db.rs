//! Database-backed tests. Each test gets a fresh schema via `#[sqlx::test]`,
//! which applies the migrations in `./migrations` before the test body runs.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use resumio::{
    accounts::{repo::Account, services::hash_password},
    app::build_app,
    config::{AppConfig, SessionConfig},
    resume::{
        dto::ResumeForm,
        repo::{Resume, ResumeError},
    },
    state::AppState,
};

/// Build the application router over the test pool, mirroring the state
/// construction in `main.rs`.
fn test_app(pool: PgPool) -> Router {
    let config = Arc::new(AppConfig {
        database_url: String::new(),
        session: SessionConfig {
            cookie_name: "sessionid".into(),
            ttl_minutes: 60,
        },
    });
    build_app(AppState::from_parts(pool, config))
}

async fn create_test_account(pool: &PgPool, username: &str) -> Account {
    let hash = hash_password("longenough1").expect("hash");
    Account::create(pool, username, &format!("{username}@example.com"), &hash)
        .await
        .expect("account created")
}

/// Log in through the router and return the `sessionid=<token>` cookie pair.
async fn login(app: &Router, username: &str) -> String {
    let res = app
        .clone()
        .oneshot(post_form(
            "/accounts/login/",
            &format!("username={username}&password=longenough1"),
        ))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    session_cookie(&res).expect("session cookie set on login")
}

fn session_cookie(res: &Response) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with("sessionid=") && !c.starts_with("sessionid=;"))
        .and_then(|c| c.split(';').next())
        .map(str::to_string)
}

async fn body_json(res: Response) -> Value {
    let bytes = res.into_body().collect().await.expect("read body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie.to_string())
        .body(Body::empty())
        .expect("request")
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn post_form_with_cookie(uri: &str, body: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookie.to_string())
        .body(Body::from(body.to_string()))
        .expect("request")
}

// ---------------------------------------------------------------------------
// Resume repository
// ---------------------------------------------------------------------------

/// The unique constraint on `resumes.account_id` is the real one-per-account
/// guard: a second insert for the same account maps to `Conflict`.
#[sqlx::test]
async fn second_resume_insert_for_an_account_is_a_conflict(pool: PgPool) {
    let account = create_test_account(&pool, "jane").await;
    let form = ResumeForm {
        full_name: "Jane Doe".into(),
        ..ResumeForm::default()
    };

    Resume::create_for(&pool, account.id, &form)
        .await
        .expect("first insert succeeds");

    let err = Resume::create_for(&pool, account.id, &form)
        .await
        .expect_err("second insert must fail");
    assert!(matches!(err, ResumeError::Conflict));
}

/// A missing resume is `NotFound`, not a driver error.
#[sqlx::test]
async fn fetching_an_absent_resume_is_not_found(pool: PgPool) {
    let err = Resume::get_for(&pool, Uuid::new_v4())
        .await
        .expect_err("no resume exists");
    assert!(matches!(err, ResumeError::NotFound));
}

/// Updates keep `created_at` and move `updated_at` forward.
#[sqlx::test]
async fn update_preserves_created_at_and_advances_updated_at(pool: PgPool) {
    let account = create_test_account(&pool, "jane").await;
    let form = ResumeForm {
        full_name: "Jane Doe".into(),
        ..ResumeForm::default()
    };
    let created = Resume::create_for(&pool, account.id, &form)
        .await
        .expect("insert");

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let form = ResumeForm {
        full_name: "Jane A. Doe".into(),
        ..created.form()
    };
    let updated = Resume::update_for(&pool, account.id, &form)
        .await
        .expect("update");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.full_name, "Jane A. Doe");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// A registration that collides on username redisplays the form with a
/// field error and leaves no second account behind.
#[sqlx::test]
async fn duplicate_username_registration_creates_no_account(pool: PgPool) {
    create_test_account(&pool, "jane").await;
    let app = test_app(pool.clone());

    let res = app
        .oneshot(post_form(
            "/accounts/register/",
            "username=jane&email=other%40example.com\
             &password=longenough1&password_confirmation=longenough1",
        ))
        .await
        .expect("response");

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["template"], "accounts/register.html");
    assert!(body["context"]["errors"]["username"].is_string());

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM accounts")
        .fetch_one(&pool)
        .await
        .expect("count accounts");
    assert_eq!(count, 1);
}

// ---------------------------------------------------------------------------
// Signed-in flow
// ---------------------------------------------------------------------------

/// The full signed-in path: log in, see an empty dashboard, create a
/// resume, see it on the dashboard, then view the portfolio with the
/// skills field split into a list.
#[sqlx::test]
async fn login_create_and_portfolio_round_trip(pool: PgPool) {
    create_test_account(&pool, "jane").await;
    let app = test_app(pool);
    let cookie = login(&app, "jane").await;

    let res = app
        .clone()
        .oneshot(get_with_cookie("/dashboard/", &cookie))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["context"]["has_resume"], false);

    let res = app
        .clone()
        .oneshot(post_form_with_cookie(
            "/resume/create/",
            "full_name=Jane+Doe&skills=Python%2C+Django+%2C++SQL",
            &cookie,
        ))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let res = app
        .clone()
        .oneshot(get_with_cookie("/dashboard/", &cookie))
        .await
        .expect("response");
    let body = body_json(res).await;
    assert_eq!(body["context"]["has_resume"], true);
    assert_eq!(body["context"]["resume"]["full_name"], "Jane Doe");

    let res = app
        .oneshot(get_with_cookie("/portfolio/", &cookie))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(
        body["context"]["skills_list"],
        serde_json::json!(["Python", "Django", "SQL"])
    );
}
