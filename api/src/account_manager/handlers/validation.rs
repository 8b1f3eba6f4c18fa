//! Field rules of the profile and password forms.

use common::constants::{
    NAME_MAX_LEN, NAME_MIN_LEN, PASSWORD_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN,
};
use common::error_code::AccountManagerError;
use common::error_code::AccountManagerError::ValidationFailure;

const COMMON_PASSWORDS: [&str; 20] = [
    "password",
    "password1",
    "12345678",
    "123456789",
    "1234567890",
    "11111111",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "abc12345",
    "admin123",
    "letmein1",
    "welcome1",
    "sunshine",
    "football",
    "baseball",
    "princess",
    "dragon12",
    "monkey12",
    "trustno1",
];

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(char::is_numeric)
}

pub fn check_username(username: &str) -> Result<(), AccountManagerError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        Err(ValidationFailure(format!(
            "username must be between {} and {} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )))?
    }
    if is_numeric(username) {
        Err(ValidationFailure("this username is entirely numeric".to_string()))?
    }
    Ok(())
}

/// `field` names the value in the message, e.g. "first name".
pub fn check_name(field: &str, value: &str) -> Result<(), AccountManagerError> {
    let len = value.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        Err(ValidationFailure(format!(
            "{} must be between {} and {} characters",
            field, NAME_MIN_LEN, NAME_MAX_LEN
        )))?
    }
    if is_numeric(value) {
        Err(ValidationFailure(format!("this {} is entirely numeric", field)))?
    }
    Ok(())
}

pub fn check_password(
    password: &str,
    confirm_password: &str,
    username: &str,
) -> Result<(), AccountManagerError> {
    if password != confirm_password {
        Err(ValidationFailure(
            "password and confirmation password do not match".to_string(),
        ))?
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        Err(ValidationFailure(format!(
            "this password is too short, it must contain at least {} characters",
            PASSWORD_MIN_LEN
        )))?
    }
    if is_numeric(password) {
        Err(ValidationFailure("this password is entirely numeric".to_string()))?
    }
    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        Err(ValidationFailure("this password is too common".to_string()))?
    }
    if !username.is_empty() && lowered.contains(&username.to_lowercase()) {
        Err(ValidationFailure(
            "the password is too similar to the username".to_string(),
        ))?
    }
    Ok(())
}
