use std::collections::BTreeMap;

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::error;

use crate::accounts::dto::RegisterForm;

/// Field name to user-facing message, in stable field order.
pub type FieldErrors = BTreeMap<&'static str, String>;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
    }
    !username.is_empty() && username.chars().count() <= 150 && USERNAME_RE.is_match(username)
}

/// Minimum-strength policy. Swap the body if requirements grow.
pub(crate) fn password_meets_policy(password: &str) -> bool {
    password.len() >= 8
}

pub fn validate_register(form: &RegisterForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !is_valid_username(form.username.trim()) {
        errors.insert(
            "username",
            "Enter a valid username: letters, digits and @/./+/-/_ only.".into(),
        );
    }
    if !is_valid_email(form.email.trim()) {
        errors.insert("email", "Enter a valid email address.".into());
    }
    if !password_meets_policy(&form.password) {
        errors.insert("password", "Password must be at least 8 characters.".into());
    }
    if form.password != form.password_confirmation {
        errors.insert(
            "password_confirmation",
            "The two password fields didn't match.".into(),
        );
    }
    errors
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}


#[cfg(test)]
mod validation_tests {
    use super::*;

    fn form(username: &str, email: &str, password: &str, confirmation: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            password_confirmation: confirmation.into(),
        }
    }

    #[test]
    fn accepts_a_well_formed_registration() {
        let form = form("jane.doe", "jane@example.com", "longenough1", "longenough1");
        assert!(validate_register(&form).is_empty());
    }

    #[test]
    fn rejects_empty_and_malformed_usernames() {
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("has spaces"));
        assert!(!is_valid_username(&"x".repeat(151)));
        assert!(is_valid_username("jane.doe+test@site-1_x"));
    }

    #[test]
    fn username_cap_counts_chars_not_bytes() {
        // `\w` is Unicode-aware, so a 150-char multibyte name is valid.
        assert!(is_valid_username(&"ü".repeat(150)));
        assert!(!is_valid_username(&"ü".repeat(151)));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(is_valid_email("jane@example.com"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
    }

    #[test]
    fn rejects_short_password() {
        let errors = validate_register(&form("jane", "jane@example.com", "short", "short"));
        assert!(errors.contains_key("password"));
        assert!(!errors.contains_key("password_confirmation"));
    }

    #[test]
    fn rejects_mismatched_confirmation() {
        let errors = validate_register(&form(
            "jane",
            "jane@example.com",
            "longenough1",
            "different1",
        ));
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("password_confirmation"));
    }
}
