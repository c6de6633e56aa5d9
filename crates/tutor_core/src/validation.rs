//! crates/tutor_core/src/validation.rs
//!
//! Input checks that run before any store or generation call.

use regex::Regex;
use std::sync::OnceLock;

use crate::ports::{PortError, PortResult};

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$";

static EMAIL_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MIN_QUESTION_CHARS: usize = 5;

pub const DEFAULT_ALLOWED_DOMAINS: [&str; 5] =
    ["gmail.com", "yahoo.com", "outlook.com", "hotmail.com", "icloud.com"];

/// A sign-up that passed validation, with normalized name and email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub name: String,
    pub email: String,
}

/// Sign-up rules: email providers the service accepts registrations from.
#[derive(Debug, Clone)]
pub struct SignupPolicy {
    allowed_domains: Vec<String>,
}

impl Default for SignupPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect())
    }
}

impl SignupPolicy {
    pub fn new(allowed_domains: Vec<String>) -> Self {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    pub fn validate(&self, name: &str, email: &str, password: &str) -> PortResult<ValidSignup> {
        let name = name.trim();
        if name.chars().count() < MIN_NAME_CHARS {
            return Err(PortError::Invalid(format!(
                "Name must be at least {} characters.",
                MIN_NAME_CHARS
            )));
        }

        let email = normalize_email(email)?;
        let domain = email.rsplit('@').next().unwrap_or_default();
        if !self.allowed_domains.iter().any(|d| d == domain) {
            return Err(PortError::Invalid(
                "This email domain is not allowed. Please use a valid provider.".to_string(),
            ));
        }

        validate_password(password)?;

        Ok(ValidSignup {
            name: name.to_string(),
            email,
        })
    }
}

/// Trims and lowercases an email after checking its shape.
pub fn normalize_email(email: &str) -> PortResult<String> {
    let email = email.trim().to_ascii_lowercase();
    let pattern = EMAIL_REGEX
        .get_or_init(|| Regex::new(EMAIL_PATTERN))
        .as_ref()
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    if !pattern.is_match(&email) {
        return Err(PortError::Invalid(
            "Please enter a valid email address.".to_string(),
        ));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> PortResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(PortError::Invalid(format!(
            "Password must be at least {} characters.",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

/// Rejects blank values for a required text field.
pub fn require_text(field: &str, value: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        return Err(PortError::Invalid(format!("{} must not be empty.", field)));
    }
    Ok(())
}

/// Questions about uploaded notes need a little substance.
pub fn validate_question(question: &str) -> PortResult<()> {
    if question.trim().chars().count() < MIN_QUESTION_CHARS {
        return Err(PortError::Invalid("Please ask a clear question.".to_string()));
    }
    Ok(())
}
