//! Password strength rules for new passwords.

use serde::Serialize;

use parkhub_core::config::AuthConfig;

use crate::error::{AuthError, AuthResult};

/// Result of a strength check. `errors` lists every violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl PasswordStrength {
    /// Convert into a policy violation carrying every failed rule.
    pub fn into_result(self) -> AuthResult<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(AuthError::PasswordPolicyViolation(self.errors))
        }
    }
}

/// Validates password strength against configured length bounds and
/// character-class rules.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
    max_length: usize,
}

impl PasswordValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            max_length: config.password_max_length,
        }
    }

    /// Check every rule and report all violations together.
    pub fn validate_strength(&self, password: &str) -> PasswordStrength {
        let mut errors = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            errors.push(format!(
                "Password must be at least {} characters long",
                self.min_length
            ));
        }
        if length > self.max_length {
            errors.push(format!(
                "Password must be at most {} characters long",
                self.max_length
            ));
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            errors.push("Password must contain at least one uppercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            errors.push("Password must contain at least one lowercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Password must contain at least one digit".to_string());
        }
        if !password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            errors.push("Password must contain at least one special character".to_string());
        }

        PasswordStrength {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}
