//! Input validation for account creation and login

use super::models::LoginRequest;
use crate::common::validation::parse_date;
use crate::common::{ValidationResult, Validator};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Fields every new account carries. `password` is `None` for OAuth signups.
#[derive(Debug)]
pub struct AccountFields<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub dob: &'a str,
    pub password: Option<&'a str>,
}

pub struct AccountValidator;

impl<'a> Validator<AccountFields<'a>> for AccountValidator {
    fn validate(&self, data: &AccountFields<'a>) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.require("name", data.name);
        result.require("email", data.email);

        if data.dob.trim().is_empty() {
            result.add_error("dob", "dob is required");
        } else if parse_date(data.dob).is_err() {
            result.add_error("dob", "Date of birth must be in YYYY-MM-DD format");
        }

        if let Some(password) = data.password {
            if password.chars().count() < MIN_PASSWORD_LEN {
                result.add_error("password", "Password must be at least 8 characters");
            }
        }

        result
    }
}

pub struct LoginValidator;

impl Validator<LoginRequest> for LoginValidator {
    fn validate(&self, data: &LoginRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require("email", &data.email);
        if data.password.is_empty() {
            result.add_error("password", "password is required");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(password: Option<&'a str>, dob: &'a str) -> AccountFields<'a> {
        AccountFields {
            name: "testuser",
            email: "test@example.com",
            dob,
            password,
        }
    }

    #[test]
    fn test_valid_password_account() {
        let result = AccountValidator.validate(&fields(Some("testpassword"), "2020-01-01"));
        assert!(result.is_valid);
    }

    #[test]
    fn test_short_password_rejected() {
        let result = AccountValidator.validate(&fields(Some("1234567"), "2020-01-01"));
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "password");
    }

    #[test]
    fn test_oauth_account_skips_password_rule() {
        let result = AccountValidator.validate(&fields(None, "2020-01-01"));
        assert!(result.is_valid);
    }

    #[test]
    fn test_bad_or_missing_dob() {
        assert!(!AccountValidator.validate(&fields(None, "2020/01/01")).is_valid);
        assert!(!AccountValidator.validate(&fields(None, "")).is_valid);
    }

    #[test]
    fn test_login_requires_both_fields() {
        let req = LoginRequest {
            email: "".to_string(),
            password: "".to_string(),
        };
        let result = LoginValidator.validate(&req);
        assert_eq!(result.errors.len(), 2);
    }
}
