/// Account input rules
///
/// Accounts are created and deleted only through the management routes and
/// never modified otherwise. The password is never stored: `credential_hash`
/// holds the output of [`PasswordSalter`](crate::auth::password::PasswordSalter).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id BIGSERIAL PRIMARY KEY,
///     username VARCHAR(20) NOT NULL UNIQUE,
///     credential_hash TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Input rules
///
/// - username: letters and digits only, 3 to 20 characters
/// - password: letters, digits or one of `!@#$%^&*`, 5 to 20 characters
///
/// A letter is any code point in a Unicode letter category (`Lu`, `Ll`,
/// `Lt`, `Lm`, `Lo`) and a digit is a decimal digit (`Nd`). Other numerals
/// such as `²` or `Ⅻ` and combining marks are rejected. The first offending
/// character decides the reported error; lengths are counted in Unicode
/// code points.

use std::borrow::Cow;
use unicode_general_category::{get_general_category, GeneralCategory};
use validator::ValidationError;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 20;
pub const MIN_PASSWORD_LENGTH: usize = 5;
pub const MAX_PASSWORD_LENGTH: usize = 20;

/// Punctuation accepted in passwords besides letters and digits
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*";

/// Validation code reported for a rejected username
pub const USERNAME_REQUIRED: &str = "USERNAME_REQUIRED";

/// Validation code reported for a rejected password
pub const PASSWORD_REQUIRED: &str = "PASSWORD_REQUIRED";

fn is_letter_or_digit(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::DecimalNumber
    )
}

fn rejection(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Checks a username against the account rules.
///
/// # Errors
///
/// Returns a [`ValidationError`] with code [`USERNAME_REQUIRED`].
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let mut count = 0;

    for c in username.chars() {
        if !is_letter_or_digit(c) {
            return Err(rejection(
                USERNAME_REQUIRED,
                "only letters and numbers required".to_string(),
            ));
        }
        count += 1;
    }

    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&count) {
        return Err(rejection(
            USERNAME_REQUIRED,
            format!("min {MIN_USERNAME_LENGTH}, max {MAX_USERNAME_LENGTH}"),
        ));
    }

    Ok(())
}

/// Checks a plaintext password against the account rules.
///
/// # Errors
///
/// Returns a [`ValidationError`] with code [`PASSWORD_REQUIRED`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let mut count = 0;

    for c in password.chars() {
        if !(is_letter_or_digit(c) || PASSWORD_SPECIAL_CHARS.contains(c)) {
            return Err(rejection(
                PASSWORD_REQUIRED,
                format!("only letters, numbers or {PASSWORD_SPECIAL_CHARS} required"),
            ));
        }
        count += 1;
    }

    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&count) {
        return Err(rejection(
            PASSWORD_REQUIRED,
            format!("min {MIN_PASSWORD_LENGTH}, max {MAX_PASSWORD_LENGTH}"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("alice1").is_ok());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username("пользователь").is_ok());
    }

    #[test]
    fn test_username_length_bounds() {
        let err = validate_username("ab").unwrap_err();
        assert_eq!(err.code, USERNAME_REQUIRED);
        assert_eq!(err.message.as_deref(), Some("min 3, max 20"));

        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_username_rejects_first_invalid_character() {
        let err = validate_username("a!").unwrap_err();
        assert_eq!(err.code, USERNAME_REQUIRED);
        // the character check wins over the (also failing) length check
        assert_eq!(err.message.as_deref(), Some("only letters and numbers required"));

        assert!(validate_username("alice bob").is_err());
        assert!(validate_username("alice_1").is_err());
    }

    #[test]
    fn test_valid_passwords() {
        assert!(validate_password("Secret1!").is_ok());
        assert!(validate_password("!@#$%^&*").is_ok());
        assert!(validate_password("abcde").is_ok());
    }

    #[test]
    fn test_password_rules() {
        let err = validate_password("abcd").unwrap_err();
        assert_eq!(err.code, PASSWORD_REQUIRED);
        assert_eq!(err.message.as_deref(), Some("min 5, max 20"));

        let err = validate_password("secret(1)").unwrap_err();
        assert_eq!(
            err.message.as_deref(),
            Some("only letters, numbers or !@#$%^&* required")
        );

        assert!(validate_password(&"x".repeat(21)).is_err());
        assert!(validate_password("with space").is_err());
    }

    #[test]
    fn test_non_decimal_numerals_and_marks_are_rejected() {
        for username in ["ab²", "abⅫ", "ab\u{345}", "ab\u{301}"] {
            let err = validate_username(username).unwrap_err();
            assert_eq!(
                err.message.as_deref(),
                Some("only letters and numbers required"),
                "{username:?} accepted"
            );
        }

        let err = validate_password("Secret²!").unwrap_err();
        assert_eq!(err.code, PASSWORD_REQUIRED);
        assert_eq!(
            err.message.as_deref(),
            Some("only letters, numbers or !@#$%^&* required")
        );
    }

    #[test]
    fn test_non_latin_letters_and_digits_are_accepted() {
        assert!(validate_username("ǅemal").is_ok());
        assert!(validate_username("用户名").is_ok());
        assert!(validate_username("abc٣").is_ok());
        assert!(validate_password("Пароль١!").is_ok());
    }
}
