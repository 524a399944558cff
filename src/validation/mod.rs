//! Field-level validation rules for the credential form.
//!
//! Pure functions mapping a raw field value to an optional error message, so
//! any interface layer can run them. They mirror what the form enforces
//! before submitting; the endpoint never trusts them for security decisions
//! and re-checks what actually matters (presence, confirmation match).

use regex::Regex;

pub const EMAIL_MAX_LENGTH: usize = 255;
pub const PASSWORD_MIN_LENGTH: usize = 10;

const WEAK_PASSWORDS: [&str; 4] = ["123456", "password", "12345678", "qwerty"];

/// On-blur check: any field is required once touched.
#[must_use]
pub fn validate_field(name: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{name} is required."));
    }

    None
}

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Login email rules: required, well-formed, bounded length.
#[must_use]
pub fn login_email_error(email: &str) -> Option<String> {
    let email = email.trim();

    if email.is_empty() {
        return Some("Email is required.".to_string());
    }
    if email.len() > EMAIL_MAX_LENGTH {
        return Some("Email is too long.".to_string());
    }
    if !valid_email(email) {
        return Some("Please enter a valid email address.".to_string());
    }

    None
}

/// Signup email rules: login rules plus the Gmail-only restriction with at
/// least 9 characters before the `@`. Comparison is lowercased, matching the
/// backend's case-insensitive column.
#[must_use]
pub fn signup_email_error(email: &str) -> Option<String> {
    if let Some(err) = login_email_error(email) {
        return Some(err);
    }

    let email = email.trim().to_lowercase();

    let gmail = Regex::new(r"^[a-z0-9._%+-]{9,}@gmail\.com$");
    if !gmail.map_or(false, |re| re.is_match(&email)) {
        return Some(
            "Email must be a valid Gmail address with at least 9 characters before @".to_string(),
        );
    }

    None
}

/// Login password rule: required only; the stored hash decides the rest.
#[must_use]
pub fn login_password_error(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required.".to_string());
    }

    None
}

/// Signup password rules: minimum length, letters and digits, no spaces,
/// not on the weak list.
#[must_use]
pub fn signup_password_error(password: &str) -> Option<String> {
    if password.len() < PASSWORD_MIN_LENGTH {
        return Some(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters."
        ));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Some("Password must contain letters.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain numbers.".to_string());
    }
    if password.contains(' ') {
        return Some("Password must not contain spaces.".to_string());
    }
    if WEAK_PASSWORDS.contains(&password) {
        return Some("Password is too weak.".to_string());
    }

    None
}

/// Confirmation rules: required and equal to the password.
#[must_use]
pub fn confirm_password_error(password: &str, confirm: &str) -> Option<String> {
    if confirm.is_empty() {
        return Some("Confirm password is required.".to_string());
    }
    if password != confirm {
        return Some("Passwords do not match.".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_field_required() {
        assert_eq!(
            validate_field("email", "   "),
            Some("email is required.".to_string())
        );
        assert_eq!(validate_field("email", "x@y.z"), None);
    }

    #[test]
    fn test_login_email_rules() {
        assert!(login_email_error("").is_some());
        assert!(login_email_error("not-an-email").is_some());
        assert!(login_email_error("a@b").is_some());
        assert!(login_email_error("someone@example.com").is_none());

        let long_local = "a".repeat(EMAIL_MAX_LENGTH);
        assert_eq!(
            login_email_error(&format!("{long_local}@example.com")),
            Some("Email is too long.".to_string())
        );
    }

    #[test]
    fn test_signup_email_requires_gmail() {
        assert!(signup_email_error("someone@example.com").is_some());
        // local part below 9 characters
        assert!(signup_email_error("short@gmail.com").is_some());
        assert!(signup_email_error("longenough@gmail.com").is_none());
        // lowercased before matching
        assert!(signup_email_error("LongEnough@Gmail.Com").is_none());
    }

    #[test]
    fn test_login_password_rules() {
        assert!(login_password_error("").is_some());
        assert!(login_password_error("x").is_none());
    }

    #[test]
    fn test_signup_password_rules() {
        assert_eq!(
            signup_password_error("short1"),
            Some("Password must be at least 10 characters.".to_string())
        );
        assert_eq!(
            signup_password_error("1234567890"),
            Some("Password must contain letters.".to_string())
        );
        assert_eq!(
            signup_password_error("abcdefghij"),
            Some("Password must contain numbers.".to_string())
        );
        assert_eq!(
            signup_password_error("abcde 1234"),
            Some("Password must not contain spaces.".to_string())
        );
        assert!(signup_password_error("correct4horse").is_none());
    }

    #[test]
    fn test_weak_passwords_rejected_by_other_rules_first() {
        // Every entry on the weak list already fails an earlier rule, so the
        // list is a backstop; it still has to hold.
        for weak in WEAK_PASSWORDS {
            assert!(signup_password_error(weak).is_some());
        }
    }

    #[test]
    fn test_confirm_password_rules() {
        assert_eq!(
            confirm_password_error("secret", ""),
            Some("Confirm password is required.".to_string())
        );
        assert_eq!(
            confirm_password_error("secret", "other"),
            Some("Passwords do not match.".to_string())
        );
        assert!(confirm_password_error("secret", "secret").is_none());
    }
}
