use lazy_static::lazy_static;
use regex::Regex;

use crate::accounts::services::{is_valid_email, FieldErrors};
use crate::resume::dto::ResumeForm;

pub(crate) fn is_valid_url(url: &str) -> bool {
    lazy_static! {
        static ref URL_RE: Regex = Regex::new(r"^https?://[^\s]+\.[^\s]+$").unwrap();
    }
    URL_RE.is_match(url)
}

/// Format failures on the optional contact/link fields block the save,
/// matching the hard-validation behavior of the form this replaces.
pub fn validate(form: &ResumeForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let full_name = form.full_name.trim();
    if full_name.is_empty() {
        errors.insert("full_name", "Full name is required.".into());
    } else if full_name.chars().count() > 100 {
        errors.insert(
            "full_name",
            "Full name must be 100 characters or fewer.".into(),
        );
    }

    if form.contact_phone.chars().count() > 20 {
        errors.insert(
            "contact_phone",
            "Phone number must be 20 characters or fewer.".into(),
        );
    }

    let contact_email = form.contact_email.trim();
    if !contact_email.is_empty() && !is_valid_email(contact_email) {
        errors.insert("contact_email", "Enter a valid email address.".into());
    }

    for (field, value) in [("linkedin", &form.linkedin), ("github", &form.github)] {
        let value = value.trim();
        if !value.is_empty() && !is_valid_url(value) {
            errors.insert(field, "Enter a valid URL.".into());
        }
    }

    errors
}

/// Split the informal comma-separated skills field into display items:
/// trim each piece, drop empties, keep left-to-right order. Pure.
pub fn skills_as_list(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
