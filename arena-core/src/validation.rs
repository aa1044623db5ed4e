//! Local form validation.
//!
//! Nothing in here touches the network: a form that fails these checks
//! never becomes a request.

use crate::{
    common::{SendOtpRequest, SignupRequest},
    messages::MessageKey,
    otp::OTP_LENGTH,
};
use validator::{Validate, ValidationError};

/// Signup form as typed by the user
#[derive(Debug, Clone, Validate)]
pub struct SignupForm {
    /// Mobile number, `09xxxxxxxxx`
    #[validate(custom = "valid_phone_number")]
    pub phone_number: String,
    /// Chosen password
    #[validate(length(min = 8))]
    pub password: String,
    /// Password, again
    pub confirm_password: String,
}

impl SignupForm {
    /// Check the form and turn it into a request body.
    ///
    /// Checks run in this order: phone number, password confirmation,
    /// then password length. Differing passwords always report a
    /// mismatch, however short they are.
    pub fn check(&self) -> Result<SignupRequest, MessageKey> {
        let form = Self {
            phone_number: normalize_digits(&self.phone_number),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        };

        let errors = form.validate().err();
        let rejected = |field: &str| {
            errors
                .as_ref()
                .is_some_and(|errors| errors.field_errors().contains_key(field))
        };

        if rejected("phone_number") {
            return Err(MessageKey::InvalidPhone);
        }
        if form.password != form.confirm_password {
            return Err(MessageKey::PasswordMismatch);
        }
        if rejected("password") {
            return Err(MessageKey::ShortPassword);
        }
        if let Some(errors) = errors {
            tracing::debug!(%errors, "Signup form rejected");
            return Err(MessageKey::InvalidInput);
        }

        Ok(SignupRequest {
            phone_number: form.phone_number,
            password: form.password,
        })
    }
}

/// A form with only a phone number (login, password reset)
#[derive(Debug, Clone, Validate)]
pub struct PhoneForm {
    /// Mobile number, `09xxxxxxxxx`
    #[validate(custom = "valid_phone_number")]
    pub phone_number: String,
}

impl PhoneForm {
    /// Check the form and turn it into an OTP request.
    pub fn check(&self) -> Result<SendOtpRequest, MessageKey> {
        let form = Self {
            phone_number: normalize_digits(&self.phone_number),
        };
        form.validate().map_err(|_| MessageKey::InvalidPhone)?;
        Ok(SendOtpRequest {
            identifier: form.phone_number,
        })
    }
}

/// Check a one-time code: exactly [`OTP_LENGTH`] digits once normalized.
pub fn check_otp_code(code: &str) -> Result<String, MessageKey> {
    let code = normalize_digits(code);
    if code.chars().count() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(MessageKey::InvalidOtp)
    }
}

/// Map a single Persian (`۰`-`۹`) or Arabic-Indic (`٠`-`٩`) digit to ASCII.
/// Other characters are returned unchanged.
pub fn normalize_digit(c: char) -> char {
    match c {
        '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
        '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
        _ => c,
    }
}

/// Trim `s` and normalize all its digits to ASCII.
pub fn normalize_digits(s: &str) -> String {
    s.trim().chars().map(normalize_digit).collect()
}

fn valid_phone_number(s: &str) -> Result<(), ValidationError> {
    if s.len() == 11 && s.starts_with("09") && s.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("not an 09xxxxxxxxx mobile number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use testresult::TestResult;

    fn signup(phone: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            phone_number: phone.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_password_mismatch() {
        assert_matches!(
            signup("09123456789", "secret-one", "secret-two").check(),
            Err(MessageKey::PasswordMismatch)
        );
        // Mismatch wins over length
        assert_matches!(
            signup("09123456789", "abc", "abd").check(),
            Err(MessageKey::PasswordMismatch)
        );
    }

    #[test]
    fn test_short_password() {
        assert_matches!(
            signup("09123456789", "short", "short").check(),
            Err(MessageKey::ShortPassword)
        );
    }

    #[test]
    fn test_invalid_phone_numbers() {
        for phone in ["", "9123456789", "0912345678", "091234567890", "08123456789", "0912345678a"] {
            assert_matches!(
                signup(phone, "long-enough", "long-enough").check(),
                Err(MessageKey::InvalidPhone),
                "{phone}"
            );
        }
    }

    #[test]
    fn test_phone_checked_before_password() {
        assert_matches!(
            signup("123", "x", "y").check(),
            Err(MessageKey::InvalidPhone)
        );
    }

    #[test_log::test]
    fn test_valid_signup() -> TestResult {
        let request = signup(" 09123456789 ", "long-enough", "long-enough").check()?;
        assert_eq!(request.phone_number, "09123456789");
        assert_eq!(request.password, "long-enough");
        Ok(())
    }

    #[test_log::test]
    fn test_persian_digits_are_normalized() -> TestResult {
        let request = PhoneForm {
            phone_number: "۰۹۱۲۳۴۵۶۷۸۹".to_string(),
        }
        .check()?;
        assert_eq!(request.identifier, "09123456789");
        assert_eq!(check_otp_code("١٢٣٤٥٦"), Ok("123456".to_string()));
        Ok(())
    }

    #[test]
    fn test_otp_code_length() {
        assert_eq!(check_otp_code("12345"), Err(MessageKey::InvalidOtp));
        assert_eq!(check_otp_code("1234567"), Err(MessageKey::InvalidOtp));
        assert_eq!(check_otp_code("12a456"), Err(MessageKey::InvalidOtp));
        assert_eq!(check_otp_code(" 123456 "), Ok("123456".to_string()));
    }
}
