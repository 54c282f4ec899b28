//! Validation Traits
//!
//! Common validation patterns extracted from route handlers.
//! These traits reduce boilerplate and improve consistency.

use crate::error::{ApiError, ApiResult};

/// Minimum length of a password in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum length of a username in characters.
pub const MIN_USERNAME_LEN: usize = 5;

/// Minimum length of an email address in characters.
pub const MIN_EMAIL_LEN: usize = 5;

/// Trait for validating non-empty strings.
///
/// # Example
/// ```ignore
/// use papyr_api::validation::ValidateNonEmpty;
///
/// fn create_note(title: &str) -> ApiResult<()> {
///     title.validate_non_empty("title")?;
///     // ... rest of logic
/// }
/// ```
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty.
    ///
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for &str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        (*self).validate_non_empty(field_name)
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Trait for validating minimum string length.
pub trait ValidateMinLength {
    /// Validate that the value is at least `min` characters long.
    ///
    /// # Errors
    /// Returns `ApiError::validation_failed` if the value is too short.
    fn validate_min_length(&self, field_name: &str, min: usize) -> ApiResult<()>;
}

impl ValidateMinLength for str {
    fn validate_min_length(&self, field_name: &str, min: usize) -> ApiResult<()> {
        if self.chars().count() < min {
            return Err(ApiError::validation_failed(format!(
                "Field '{}' must be at least {} characters long",
                field_name, min
            )));
        }
        Ok(())
    }
}

impl ValidateMinLength for String {
    fn validate_min_length(&self, field_name: &str, min: usize) -> ApiResult<()> {
        self.as_str().validate_min_length(field_name, min)
    }
}

/// Validate an email address.
///
/// Intentionally shallow: length plus an '@' with characters on both
/// sides. Real validation happens when mail is actually sent.
pub fn validate_email(email: &str) -> ApiResult<()> {
    email.validate_non_empty("email")?;
    email.validate_min_length("email", MIN_EMAIL_LEN)?;

    let Some(at) = email.find('@') else {
        return Err(ApiError::invalid_format("email", "an email address"));
    };
    if at == 0 || at == email.len() - 1 {
        return Err(ApiError::invalid_format("email", "an email address"));
    }

    Ok(())
}

/// Validate a password against the minimum policy.
pub fn validate_password(password: &str) -> ApiResult<()> {
    password.validate_non_empty("password")?;
    password.validate_min_length("password", MIN_PASSWORD_LEN)
}

/// Validate a username against the minimum policy.
pub fn validate_username(username: &str) -> ApiResult<()> {
    username.validate_non_empty("username")?;
    username.validate_min_length("username", MIN_USERNAME_LEN)
}

/// Trait for checking if an update request has any fields set.
///
/// Implement this on update request types to provide a unified
/// "has any updates" check.
pub trait HasUpdates {
    /// Check if any update fields are set.
    fn has_any_updates(&self) -> bool;

    /// Validate that at least one update field is set.
    fn validate_has_updates(&self) -> ApiResult<()> {
        if !self.has_any_updates() {
            return Err(ApiError::invalid_input(
                "At least one field must be provided for update",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty_str() {
        assert!("hello".validate_non_empty("test").is_ok());
        assert!("".validate_non_empty("test").is_err());
        assert!("   ".validate_non_empty("test").is_err());
        assert!("  hi  ".validate_non_empty("test").is_ok());
    }

    #[test]
    fn test_validate_non_empty_option() {
        let some_str: Option<&str> = Some("hello");
        let some_empty: Option<&str> = Some("");
        let none_str: Option<&str> = None;

        assert!(some_str.validate_non_empty("test").is_ok());
        assert!(some_empty.validate_non_empty("test").is_err());
        assert!(none_str.validate_non_empty("test").is_err());
    }

    #[test]
    fn test_validate_min_length() {
        assert!("abcde".validate_min_length("test", 5).is_ok());
        assert!("abcd".validate_min_length("test", 5).is_err());
        // Counted in characters, not bytes.
        assert!("héllo".validate_min_length("test", 5).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("alice@example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("a@b").is_err()); // Too short
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("trailing@").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob").is_err());
    }
}
