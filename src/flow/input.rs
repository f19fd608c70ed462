//! Input validation for the sign-in prompts.

use regex::Regex;

/// Normalize an email before lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// MFA codes are exactly six digits, for both TOTP and emailed codes.
#[must_use]
pub fn valid_mfa_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_mfa_code_requires_six_digits() {
        assert!(valid_mfa_code("123456"));
        assert!(!valid_mfa_code("12345"));
        assert!(!valid_mfa_code("1234567"));
        assert!(!valid_mfa_code("12345a"));
        assert!(!valid_mfa_code(""));
    }
}
