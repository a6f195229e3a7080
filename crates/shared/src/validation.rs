//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a ticket subject.
pub const MAX_SUBJECT_LEN: usize = 200;

/// Maximum length of a ticket description or reply body.
pub const MAX_BODY_LEN: usize = 20_000;

/// Minimum length of a password set through the invitation flow.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validates that a ticket subject is non-blank and within length limits.
pub fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("subject_blank");
        err.message = Some("Subject must not be blank".into());
        return Err(err);
    }
    if trimmed.len() > MAX_SUBJECT_LEN {
        let mut err = ValidationError::new("subject_too_long");
        err.message = Some("Subject must be at most 200 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a message body (description or reply) is non-blank and
/// within length limits.
pub fn validate_body(body: &str) -> Result<(), ValidationError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("body_blank");
        err.message = Some("Message body must not be blank".into());
        return Err(err);
    }
    if trimmed.len() > MAX_BODY_LEN {
        let mut err = ValidationError::new("body_too_long");
        err.message = Some("Message body must be at most 20000 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates password strength for the invitation acceptance flow.
/// Length-only policy, no composition rules.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LEN {
        let mut err = ValidationError::new("password_too_short");
        err.message = Some("Password must be at least 8 characters".into());
        return Err(err);
    }
    if password.len() > 1024 {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some("Password must be at most 1024 characters".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_subject_ok() {
        assert!(validate_subject("Printer on fire").is_ok());
    }

    #[test]
    fn test_validate_subject_blank() {
        assert!(validate_subject("").is_err());
        assert!(validate_subject("   ").is_err());
    }

    #[test]
    fn test_validate_subject_too_long() {
        let long = "x".repeat(MAX_SUBJECT_LEN + 1);
        assert!(validate_subject(&long).is_err());
    }

    #[test]
    fn test_validate_subject_at_limit() {
        let exact = "x".repeat(MAX_SUBJECT_LEN);
        assert!(validate_subject(&exact).is_ok());
    }

    #[test]
    fn test_validate_body_ok() {
        assert!(validate_body("It started smoking around noon.").is_ok());
    }

    #[test]
    fn test_validate_body_blank() {
        assert!(validate_body("\n\t ").is_err());
    }

    #[test]
    fn test_validate_body_too_long() {
        let long = "y".repeat(MAX_BODY_LEN + 1);
        assert!(validate_body(&long).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough!").is_ok());
        assert!(validate_password(&"p".repeat(2000)).is_err());
    }
}
