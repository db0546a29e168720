//! Input validation for account registration.

use crate::FieldErrors;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validate a username.
///
/// Letters, digits and `@ . + - _` are allowed.
pub fn validate_username(username: &str, errors: &mut FieldErrors) {
    let len = username.chars().count();
    if username.trim().is_empty() {
        errors.add("username", "This field may not be blank.");
        return;
    }
    if len < MIN_USERNAME_LENGTH {
        errors.add(
            "username",
            format!("Ensure this field has at least {MIN_USERNAME_LENGTH} characters."),
        );
    }
    if len > MAX_USERNAME_LENGTH {
        errors.add(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
        );
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

/// Validate a password, rejecting one equal to the username.
pub fn validate_password(password: &str, username: &str, errors: &mut FieldErrors) {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."),
        );
    }
    if len > MAX_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Ensure this field has no more than {MAX_PASSWORD_LENGTH} characters."),
        );
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        errors.add("password", "The password is too similar to the username.");
    }
}

/// Validate an email address.
///
/// Only a structural check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str, errors: &mut FieldErrors) {
    if email.trim().is_empty() {
        errors.add("email", "This field may not be blank.");
        return;
    }
    if email.len() > MAX_EMAIL_LENGTH {
        errors.add(
            "email",
            format!("Ensure this field has no more than {MAX_EMAIL_LENGTH} characters."),
        );
        return;
    }
    if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && !domain.starts_with('.')
}

/// Validate all registration fields at once.
pub fn validate_registration(username: &str, email: &str, password: &str) -> crate::Result<()> {
    let mut errors = FieldErrors::new();
    validate_username(username, &mut errors);
    validate_email(email, &mut errors);
    validate_password(password, username, &mut errors);
    errors.into_result()
}
