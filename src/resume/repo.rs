use serde::Serialize;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::resume::dto::ResumeForm;

/// The single structured profile record owned by an account.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub account_id: Uuid,
    pub full_name: String,
    pub about_me: String,
    pub skills: String,
    pub education: String,
    pub projects: String,
    pub experience: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub contact_address: String,
    pub linkedin: String,
    pub github: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("no resume for this account")]
    NotFound,
    #[error("account already has a resume")]
    Conflict,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Resume {
    /// `NotFound` is the caller's signal that onboarding is incomplete.
    pub async fn get_for(db: &PgPool, account_id: Uuid) -> Result<Resume, ResumeError> {
        sqlx::query_as::<_, Resume>(
            r#"
            SELECT id, account_id, full_name, about_me, skills, education, projects,
                   experience, contact_email, contact_phone, contact_address,
                   linkedin, github, created_at, updated_at
            FROM resumes
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(db)
        .await?
        .ok_or(ResumeError::NotFound)
    }

    /// Insert the account's resume. The unique constraint on `account_id`
    /// is the real one-per-account guard; the handler's existence pre-check
    /// only picks the friendlier redirect.
    pub async fn create_for(
        db: &PgPool,
        account_id: Uuid,
        form: &ResumeForm,
    ) -> Result<Resume, ResumeError> {
        sqlx::query_as::<_, Resume>(
            r#"
            INSERT INTO resumes (account_id, full_name, about_me, skills, education,
                                 projects, experience, contact_email, contact_phone,
                                 contact_address, linkedin, github)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, account_id, full_name, about_me, skills, education, projects,
                      experience, contact_email, contact_phone, contact_address,
                      linkedin, github, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(form.full_name.trim())
        .bind(&form.about_me)
        .bind(&form.skills)
        .bind(&form.education)
        .bind(&form.projects)
        .bind(&form.experience)
        .bind(form.contact_email.trim())
        .bind(&form.contact_phone)
        .bind(&form.contact_address)
        .bind(form.linkedin.trim())
        .bind(form.github.trim())
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some("resumes_account_id_key") =>
            {
                ResumeError::Conflict
            }
            _ => ResumeError::Database(e),
        })
    }

    /// Rewrite the account's resume, refreshing `updated_at` and leaving
    /// `created_at` untouched.
    pub async fn update_for(
        db: &PgPool,
        account_id: Uuid,
        form: &ResumeForm,
    ) -> Result<Resume, ResumeError> {
        sqlx::query_as::<_, Resume>(
            r#"
            UPDATE resumes
            SET full_name = $2, about_me = $3, skills = $4, education = $5,
                projects = $6, experience = $7, contact_email = $8,
                contact_phone = $9, contact_address = $10, linkedin = $11,
                github = $12, updated_at = now()
            WHERE account_id = $1
            RETURNING id, account_id, full_name, about_me, skills, education, projects,
                      experience, contact_email, contact_phone, contact_address,
                      linkedin, github, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(form.full_name.trim())
        .bind(&form.about_me)
        .bind(&form.skills)
        .bind(&form.education)
        .bind(&form.projects)
        .bind(&form.experience)
        .bind(form.contact_email.trim())
        .bind(&form.contact_phone)
        .bind(&form.contact_address)
        .bind(form.linkedin.trim())
        .bind(form.github.trim())
        .fetch_optional(db)
        .await?
        .ok_or(ResumeError::NotFound)
    }

    /// Field values for pre-filling the edit form.
    pub fn form(&self) -> ResumeForm {
        ResumeForm {
            full_name: self.full_name.clone(),
            about_me: self.about_me.clone(),
            skills: self.skills.clone(),
            education: self.education.clone(),
            projects: self.projects.clone(),
            experience: self.experience.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: self.contact_phone.clone(),
            contact_address: self.contact_address.clone(),
            linkedin: self.linkedin.clone(),
            github: self.github.clone(),
        }
    }
}
