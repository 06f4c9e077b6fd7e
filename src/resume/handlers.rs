use axum::{
    extract::{Form, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    accounts::{services::FieldErrors, sessions::CurrentUser},
    error::AppError,
    flash::{FlashRedirect, IncomingNotices, Notice},
    render::Page,
    resume::{
        dto::ResumeForm,
        repo::{Resume, ResumeError},
        services,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/", get(dashboard))
        .route("/resume/create/", get(create_form).post(create))
        .route("/resume/edit/", get(edit_form).post(edit))
        .route("/portfolio/", get(portfolio))
        .route("/resume/download/", get(download))
}

#[instrument(skip(notices))]
pub async fn home(notices: IncomingNotices) -> Page {
    Page::new("home.html").notices(notices)
}

fn redirect_to_edit() -> Response {
    FlashRedirect::to("/resume/edit/")
        .notice(Notice::info(
            "You already have a resume. You can edit it below.",
        ))
        .into_response()
}

fn redirect_to_create() -> Response {
    FlashRedirect::to("/resume/create/")
        .notice(Notice::info("You need to create a resume first."))
        .into_response()
}

/// Repo errors the handler has no answer for. Keeps driver errors in the
/// [`AppError::Database`] variant instead of flattening them to `Internal`.
fn unexpected(err: ResumeError) -> AppError {
    match err {
        ResumeError::Database(e) => AppError::Database(e),
        other => AppError::Internal(anyhow::Error::new(other)),
    }
}

async fn find_resume(
    state: &AppState,
    user: &CurrentUser,
) -> Result<Option<Resume>, AppError> {
    match Resume::get_for(&state.db, user.account.id).await {
        Ok(resume) => Ok(Some(resume)),
        Err(ResumeError::NotFound) => Ok(None),
        Err(e) => Err(unexpected(e)),
    }
}

fn form_page(
    title: &'static str,
    button_text: &'static str,
    form: &ResumeForm,
    errors: &FieldErrors,
) -> Result<Page, AppError> {
    Ok(Page::new("resume/resume_form.html")
        .context("title", json!(title))
        .context("button_text", json!(button_text))
        .context("form", serde_json::to_value(form)?)
        .context("errors", json!(errors))
        .notice(Notice::error("Please correct the errors below.")))
}

#[instrument(skip(state, user, notices))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    notices: IncomingNotices,
) -> Result<Response, AppError> {
    let page = match find_resume(&state, &user).await? {
        Some(resume) => Page::new("resume/dashboard.html")
            .context("has_resume", json!(true))
            .context("resume", serde_json::to_value(&resume)?),
        None => Page::new("resume/dashboard.html")
            .context("has_resume", json!(false))
            .context("resume", Value::Null),
    };
    Ok(page.notices(notices).into_response())
}

#[instrument(skip(state, user, notices))]
pub async fn create_form(
    State(state): State<AppState>,
    user: CurrentUser,
    notices: IncomingNotices,
) -> Result<Response, AppError> {
    if find_resume(&state, &user).await?.is_some() {
        return Ok(redirect_to_edit());
    }
    Ok(Page::new("resume/resume_form.html")
        .context("title", json!("Create Your Resume"))
        .context("button_text", json!("Create Resume"))
        .context("form", serde_json::to_value(ResumeForm::default())?)
        .notices(notices)
        .into_response())
}

#[instrument(skip(state, user, form))]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<ResumeForm>,
) -> Result<Response, AppError> {
    if find_resume(&state, &user).await?.is_some() {
        return Ok(redirect_to_edit());
    }

    let errors = services::validate(&form);
    if !errors.is_empty() {
        return Ok(form_page("Create Your Resume", "Create Resume", &form, &errors)?.into_response());
    }

    match Resume::create_for(&state.db, user.account.id, &form).await {
        Ok(resume) => {
            info!(account_id = %user.account.id, resume_id = %resume.id, "resume created");
            Ok(FlashRedirect::to("/dashboard/")
                .notice(Notice::success("Your resume has been created successfully!"))
                .into_response())
        }
        // lost the race against another create from the same account
        Err(ResumeError::Conflict) => Ok(redirect_to_edit()),
        Err(e) => Err(unexpected(e)),
    }
}

#[instrument(skip(state, user, notices))]
pub async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    notices: IncomingNotices,
) -> Result<Response, AppError> {
    let Some(resume) = find_resume(&state, &user).await? else {
        return Ok(redirect_to_create());
    };
    Ok(Page::new("resume/resume_form.html")
        .context("title", json!("Edit Your Resume"))
        .context("button_text", json!("Save Changes"))
        .context("form", serde_json::to_value(resume.form())?)
        .notices(notices)
        .into_response())
}

#[instrument(skip(state, user, form))]
pub async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<ResumeForm>,
) -> Result<Response, AppError> {
    if find_resume(&state, &user).await?.is_none() {
        return Ok(redirect_to_create());
    }

    let errors = services::validate(&form);
    if !errors.is_empty() {
        return Ok(form_page("Edit Your Resume", "Save Changes", &form, &errors)?.into_response());
    }

    match Resume::update_for(&state.db, user.account.id, &form).await {
        Ok(resume) => {
            info!(account_id = %user.account.id, resume_id = %resume.id, "resume updated");
            Ok(FlashRedirect::to("/dashboard/")
                .notice(Notice::success("Your resume has been updated successfully!"))
                .into_response())
        }
        // the resume vanished between the check and the write
        Err(ResumeError::NotFound) => Ok(redirect_to_create()),
        Err(e) => Err(unexpected(e)),
    }
}

#[instrument(skip(state, user, notices))]
pub async fn portfolio(
    State(state): State<AppState>,
    user: CurrentUser,
    notices: IncomingNotices,
) -> Result<Response, AppError> {
    let Some(resume) = find_resume(&state, &user).await? else {
        return Ok(FlashRedirect::to("/resume/create/")
            .notice(Notice::warning("Please create your resume first."))
            .into_response());
    };

    let skills_list = services::skills_as_list(&resume.skills);

    Ok(Page::new("resume/portfolio.html")
        .context("resume", serde_json::to_value(&resume)?)
        .context("skills_list", json!(skills_list))
        .notices(notices)
        .into_response())
}

/// Placeholder until real PDF export lands; serves the portfolio view.
#[instrument(skip(state, user, notices))]
pub async fn download(
    state: State<AppState>,
    user: CurrentUser,
    notices: IncomingNotices,
) -> Result<Response, AppError> {
    portfolio(state, user, notices).await
}
