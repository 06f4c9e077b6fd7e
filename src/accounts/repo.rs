use serde::Serialize;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username already taken")]
    UsernameTaken,
    #[error("email already registered")]
    EmailTaken,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Account {
    pub async fn find_by_username(
        db: &PgPool,
        username: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Insert a new account. Unique violations are mapped per constraint so
    /// a registration that loses the race still gets a field-level error.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, AccountError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some("accounts_username_key") =>
            {
                AccountError::UsernameTaken
            }
            sqlx::Error::Database(db_err) if db_err.constraint() == Some("accounts_email_key") => {
                AccountError::EmailTaken
            }
            _ => AccountError::Database(e),
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub account_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub async fn create(
        db: &PgPool,
        account_id: Uuid,
        ttl_minutes: i64,
    ) -> Result<Session, sqlx::Error> {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, account_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, account_id, created_at, expires_at
            "#,
        )
        .bind(&token)
        .bind(account_id)
        .bind(expires_at)
        .fetch_one(db)
        .await
    }

    /// Resolve a token to its account, ignoring expired rows.
    pub async fn find_account(db: &PgPool, token: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT a.id, a.username, a.email, a.password_hash, a.created_at
            FROM accounts a
            JOIN sessions s ON s.account_id = a.id
            WHERE s.token = $1 AND s.expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    /// Logging out twice is not an error.
    pub async fn delete(db: &PgPool, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }
}
