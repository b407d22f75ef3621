//! Password policy enforcement for new passwords.

use authhub_core::config::AuthConfig;
use authhub_core::error::AppError;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length in characters.
    min_length: usize,
    /// Minimum zxcvbn score.
    min_score: zxcvbn::Score,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let min_score = match config.password_min_strength {
            0 => zxcvbn::Score::Zero,
            1 => zxcvbn::Score::One,
            2 => zxcvbn::Score::Two,
            3 => zxcvbn::Score::Three,
            _ => zxcvbn::Score::Four,
        };
        Self {
            min_length: config.password_min_length,
            min_score,
        }
    }

    /// Validates a password, reporting the first violation.
    ///
    /// `user_inputs` (typically the email) are penalised by the estimator.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        let estimate = zxcvbn::zxcvbn(password, user_inputs);
        if estimate.score() < self.min_score {
            return Err(AppError::validation(
                "Password is too weak. Please use a stronger password.",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authhub_core::error::ErrorKind;

    fn validator() -> PasswordValidator {
        PasswordValidator::new(&AuthConfig::default())
    }

    #[test]
    fn test_rejects_short_password() {
        let err = validator().validate("Ab1!", &[]).unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }

    #[test]
    fn test_rejects_common_password() {
        assert!(validator().validate("password", &[]).is_err());
        assert!(validator().validate("12345678", &[]).is_err());
    }

    #[test]
    fn test_accepts_strong_password() {
        assert!(validator().validate("Tr0ub4dor&3-staple-horse", &[]).is_ok());
    }
}
