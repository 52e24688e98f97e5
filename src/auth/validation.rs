use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::RegisterRequest;
use crate::auth::errors::ValidationKind;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims text fields and lowercases the email. Passwords are left untouched.
pub fn sanitize(form: &mut RegisterRequest) {
    for field in [
        &mut form.full_name,
        &mut form.username,
        &mut form.phone,
        &mut form.country,
    ] {
        *field = field.trim().to_string();
    }
    form.email = form.email.trim().to_lowercase();
}

/// Normalizes a login identifier: emails compare lowercased.
pub fn normalize_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    if trimmed.contains('@') {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Runs the registration checks in their fixed order and reports the first
/// failure. Expects a sanitized form.
pub fn validate_registration(form: &RegisterRequest) -> Result<(), ValidationKind> {
    let required = [
        form.full_name.as_str(),
        form.username.as_str(),
        form.email.as_str(),
        form.password.as_str(),
        form.password_confirm.as_str(),
        form.phone.as_str(),
        form.country.as_str(),
    ];
    if required.iter().any(|v| v.is_empty()) {
        return Err(ValidationKind::MissingField);
    }
    if !is_valid_email(&form.email) {
        return Err(ValidationKind::InvalidEmail);
    }
    // Login matches identifiers against both columns, so a username must
    // never look like an email.
    if form.username.contains('@') {
        return Err(ValidationKind::InvalidUsername);
    }
    if form.password != form.password_confirm {
        return Err(ValidationKind::PasswordMismatch);
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationKind::PasswordTooShort);
    }
    if !form.terms_accepted {
        return Err(ValidationKind::TermsNotAccepted);
    }
    Ok(())
}
