//! Form checks run by front-ends before handing input to the session manager.
//!
//! Each check returns the message to show the user. The session manager
//! itself does not validate; it forwards whatever it is given.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::Registration;

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum number of characters in a phone number
pub const MIN_PHONE_LENGTH: usize = 10;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

pub fn validate_sign_in(username: &str, password: &str) -> Result<(), String> {
    if username.is_empty() || password.is_empty() {
        return Err("Please enter both username and password".to_string());
    }
    Ok(())
}

/// Check a sign-up form. `confirm_password` is the second password entry.
pub fn validate_sign_up(form: &Registration, confirm_password: &str) -> Result<(), String> {
    if form.username.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return Err("Please fill in all required account fields".to_string());
    }
    if form.password != confirm_password {
        return Err("Passwords do not match".to_string());
    }
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !is_valid_email(&form.email) {
        return Err("Please enter a valid email address".to_string());
    }
    if form.phone.chars().count() < MIN_PHONE_LENGTH {
        return Err("Please enter a valid 10-digit phone number".to_string());
    }
    validate_year(form.year.as_deref())
}

/// Optional vehicle year: blank is fine, anything else must be a number
pub fn validate_year(year: Option<&str>) -> Result<(), String> {
    match year.map(str::trim) {
        Some(y) if !y.is_empty() && y.parse::<i32>().is_err() => {
            Err("Vehicle year must be a number".to_string())
        }
        _ => Ok(()),
    }
}
