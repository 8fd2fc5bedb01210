//! Validation helpers for user-supplied fields.

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;

/// Maximum length of a file or directory name.
const MAX_NAME_LEN: usize = 255;

/// Validate a user-supplied file or directory name.
///
/// Names must be non-empty after trimming and at most 255 characters.
pub fn validate_name(name: &str, what: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{what} name cannot be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "{what} name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an email address.
///
/// The host performs real address verification; the core only rejects
/// obviously malformed input.
pub fn validate_email(email: &str) -> AppResult<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("Invalid email address"));
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(AppError::validation("Invalid email address"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(AppError::validation("Invalid email address"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudkeep_core::error::ErrorKind;

    #[test]
    fn test_name_trimmed_and_accepted() {
        assert_eq!(validate_name("  Photos ", "Directory").unwrap(), "Photos");
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = validate_name("   ", "Directory").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_oversized_name_rejected() {
        let long = "x".repeat(256);
        assert_eq!(
            validate_name(&long, "File").unwrap_err().kind,
            ErrorKind::Validation
        );
        assert!(validate_name(&long[..255], "File").is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@nodot").is_err());
    }
}
