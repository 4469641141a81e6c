//! Request schema validation
//!
//! Registration and login payloads are validated before they reach the
//! repositories; the first violated rule's message is surfaced as a 400.

use std::sync::OnceLock;

use regex::Regex;

use crate::shared::error::{PlatformError, Result};

const USERNAME_MIN: usize = 4;
const USERNAME_MAX: usize = 255;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 255;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

pub fn validate_username(username: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        return Err(PlatformError::validation("username is required"));
    }
    if username.len() < USERNAME_MIN {
        return Err(PlatformError::validation(format!(
            "username must be at least {} characters",
            USERNAME_MIN
        )));
    }
    if username.len() > USERNAME_MAX {
        return Err(PlatformError::validation(format!(
            "username must not be more than {} characters",
            USERNAME_MAX
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(PlatformError::validation("email is required"));
    }
    if !email_regex().is_match(email) {
        return Err(PlatformError::validation("invalid email format"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(PlatformError::validation("password is required"));
    }
    if password.len() < PASSWORD_MIN {
        return Err(PlatformError::validation(format!(
            "password must be at least {} characters",
            PASSWORD_MIN
        )));
    }
    if password.len() > PASSWORD_MAX {
        return Err(PlatformError::validation(format!(
            "password must not be more than {} characters",
            PASSWORD_MAX
        )));
    }
    Ok(())
}

/// Registration schema: username, then email, then password.
pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<()> {
    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)
}

/// Login schema: email, then password.
pub fn validate_login(email: &str, password: &str) -> Result<()> {
    validate_email(email)?;
    validate_password(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: PlatformError) -> String {
        err.to_string()
    }

    #[test]
    fn accepts_valid_registration() {
        assert!(validate_registration("alice", "alice@example.com", "secret1").is_ok());
    }

    #[test]
    fn short_username_is_rejected_first() {
        let err = validate_registration("abc", "bad", "x").unwrap_err();
        assert_eq!(message(err), "username must be at least 4 characters");
    }

    #[test]
    fn email_format_is_checked() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("nodot@example").is_err());
    }

    #[test]
    fn short_password_is_rejected() {
        let err = validate_password("12345").unwrap_err();
        assert_eq!(message(err), "password must be at least 6 characters");
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let long = "x".repeat(256);
        assert!(validate_username(&long).is_err());
        assert!(validate_password(&long).is_err());
    }
}
