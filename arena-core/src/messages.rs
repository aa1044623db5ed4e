//! User-facing notices.
//!
//! Every failure (and most successes) a flow can report is one of the
//! [`MessageKey`]s below. The key maps to a fixed Persian template with a
//! title, a body, an optional hint and a [`Severity`]. Bodies may contain
//! `{name}` placeholders, filled in with [`Notice::fill`].

use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// How a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Something went wrong
    Error,
    /// Something worked
    Success,
    /// Neutral information
    Info,
    /// The user has to do something
    Warning,
}

/// The fixed set of named messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum MessageKey {
    NetworkError,
    LoginRequired,
    SessionExpired,
    LoggedOut,
    PasswordMismatch,
    ShortPassword,
    WeakPassword,
    InvalidPhone,
    InvalidOtp,
    InvalidInput,
    OtpRejected,
    OtpSent,
    OtpResendLocked,
    OtpVerified,
    OtpContextMissing,
    SignupSuccess,
    DuplicatePhone,
    DuplicateUsername,
    DuplicateEmail,
    EmptyTournaments,
    GenericError,
}

struct Template {
    title: &'static str,
    body: &'static str,
    hint: Option<&'static str>,
    severity: Severity,
    requires_action: bool,
}

impl MessageKey {
    /// The snake_case name of this key
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::NetworkError => "network_error",
            MessageKey::LoginRequired => "login_required",
            MessageKey::SessionExpired => "session_expired",
            MessageKey::LoggedOut => "logged_out",
            MessageKey::PasswordMismatch => "password_mismatch",
            MessageKey::ShortPassword => "short_password",
            MessageKey::WeakPassword => "weak_password",
            MessageKey::InvalidPhone => "invalid_phone",
            MessageKey::InvalidOtp => "invalid_otp",
            MessageKey::InvalidInput => "invalid_input",
            MessageKey::OtpRejected => "otp_rejected",
            MessageKey::OtpSent => "otp_sent",
            MessageKey::OtpResendLocked => "otp_resend_locked",
            MessageKey::OtpVerified => "otp_verified",
            MessageKey::OtpContextMissing => "otp_context_missing",
            MessageKey::SignupSuccess => "signup_success",
            MessageKey::DuplicatePhone => "duplicate_phone",
            MessageKey::DuplicateUsername => "duplicate_username",
            MessageKey::DuplicateEmail => "duplicate_email",
            MessageKey::EmptyTournaments => "empty_tournaments",
            MessageKey::GenericError => "generic_error",
        }
    }

    /// Render this key into a notice
    pub fn notice(self) -> Notice {
        let t = self.template();
        Notice {
            key: self,
            title: t.title.to_string(),
            body: t.body.to_string(),
            hint: t.hint.map(str::to_string),
            severity: t.severity,
            requires_action: t.requires_action,
        }
    }

    fn template(&self) -> Template {
        use Severity::*;

        let (title, body, hint, severity, requires_action) = match self {
            MessageKey::NetworkError => (
                "خطای شبکه",
                "ارتباط با سرور برقرار نشد.",
                Some("اتصال اینترنت خود را بررسی کرده و دوباره تلاش کنید."),
                Error,
                false,
            ),
            MessageKey::LoginRequired => (
                "ورود لازم است",
                "برای دسترسی به این بخش ابتدا وارد حساب کاربری شوید.",
                Some("از دستور ورود استفاده کنید."),
                Warning,
                true,
            ),
            MessageKey::SessionExpired => (
                "نشست منقضی شد",
                "نشست شما به پایان رسیده است. لطفاً دوباره وارد شوید.",
                None,
                Warning,
                true,
            ),
            MessageKey::LoggedOut => (
                "خروج",
                "از حساب کاربری خود خارج شدید.",
                None,
                Info,
                false,
            ),
            MessageKey::PasswordMismatch => (
                "عدم تطابق رمز عبور",
                "رمز عبور و تکرار آن یکسان نیستند.",
                None,
                Error,
                false,
            ),
            MessageKey::ShortPassword => (
                "رمز عبور کوتاه است",
                "رمز عبور باید حداقل ۸ کاراکتر باشد.",
                None,
                Error,
                false,
            ),
            MessageKey::WeakPassword => (
                "رمز عبور نامناسب",
                "رمز عبور انتخاب شده مورد قبول نیست.",
                Some("از ترکیب حروف و اعداد استفاده کنید."),
                Error,
                false,
            ),
            MessageKey::InvalidPhone => (
                "شماره موبایل نامعتبر",
                "شماره موبایل باید با ۰۹ شروع شده و ۱۱ رقم باشد.",
                None,
                Error,
                false,
            ),
            MessageKey::InvalidOtp => (
                "کد تأیید نامعتبر",
                "کد تأیید باید ۶ رقم باشد.",
                None,
                Error,
                false,
            ),
            MessageKey::InvalidInput => (
                "اطلاعات نامعتبر",
                "لطفاً اطلاعات وارد شده را بررسی کنید.",
                None,
                Error,
                false,
            ),
            MessageKey::OtpRejected => (
                "کد تأیید اشتباه است",
                "کد وارد شده صحیح نیست یا منقضی شده است.",
                Some("می‌توانید کد جدید درخواست کنید."),
                Error,
                false,
            ),
            MessageKey::OtpSent => (
                "کد ارسال شد",
                "کد تأیید به {identifier} ارسال شد.",
                None,
                Success,
                false,
            ),
            MessageKey::OtpResendLocked => (
                "کمی صبر کنید",
                "ارسال مجدد کد تا {seconds} ثانیه دیگر امکان‌پذیر است.",
                None,
                Info,
                false,
            ),
            MessageKey::OtpVerified => (
                "تأیید شد",
                "ورود شما با موفقیت انجام شد.",
                None,
                Success,
                false,
            ),
            MessageKey::OtpContextMissing => (
                "اطلاعات تأیید یافت نشد",
                "ابتدا ثبت‌نام یا ورود را آغاز کنید.",
                None,
                Warning,
                true,
            ),
            MessageKey::SignupSuccess => (
                "ثبت‌نام انجام شد",
                "حساب کاربری شما ساخته شد. کد تأیید را وارد کنید.",
                None,
                Success,
                false,
            ),
            MessageKey::DuplicatePhone => (
                "شماره تکراری",
                "این شماره موبایل قبلاً ثبت شده است.",
                Some("اگر حساب کاربری دارید، وارد شوید."),
                Error,
                false,
            ),
            MessageKey::DuplicateUsername => (
                "نام کاربری تکراری",
                "این نام کاربری قبلاً استفاده شده است.",
                None,
                Error,
                false,
            ),
            MessageKey::DuplicateEmail => (
                "ایمیل تکراری",
                "این ایمیل قبلاً ثبت شده است.",
                None,
                Error,
                false,
            ),
            MessageKey::EmptyTournaments => (
                "تورنمنتی یافت نشد",
                "در حال حاضر تورنمنتی برای نمایش وجود ندارد.",
                None,
                Info,
                false,
            ),
            MessageKey::GenericError => (
                "خطا",
                "مشکلی پیش آمد. لطفاً دوباره تلاش کنید.",
                None,
                Error,
                false,
            ),
        };

        Template {
            title,
            body,
            hint,
            severity,
            requires_action,
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered message, ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Which message this is
    pub key: MessageKey,
    /// Short headline
    pub title: String,
    /// The message itself
    pub body: String,
    /// What the user could do about it
    pub hint: Option<String>,
    /// Presentation category
    pub severity: Severity,
    /// Whether the notice stays until the user acts on it
    pub requires_action: bool,
}

impl Notice {
    /// Replace every `{name}` placeholder in the body with `value`.
    pub fn fill(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.body = self.body.replace(&format!("{{{name}}}"), &value.to_string());
        self
    }

    /// How long the notice stays visible, `None` if it has to be dismissed
    /// by the user.
    pub fn dismiss_after(&self) -> Option<Duration> {
        if self.requires_action {
            return None;
        }
        Some(match self.severity {
            Severity::Error => Duration::from_secs(6),
            Severity::Warning => Duration::from_secs(5),
            Severity::Success | Severity::Info => Duration::from_secs(4),
        })
    }
}

impl From<MessageKey> for Notice {
    fn from(key: MessageKey) -> Self {
        key.notice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_placeholder() {
        let notice = MessageKey::OtpResendLocked.notice().fill("seconds", 42);
        assert!(notice.body.contains("42"));
        assert!(!notice.body.contains("{seconds}"));
    }

    #[test]
    fn test_fill_unknown_placeholder_is_noop() {
        let notice = MessageKey::NetworkError.notice();
        assert_eq!(notice.clone().fill("seconds", 1), notice);
    }

    #[test]
    fn test_action_required_notices_stay() {
        assert_eq!(MessageKey::LoginRequired.notice().dismiss_after(), None);
        assert_eq!(
            MessageKey::GenericError.notice().dismiss_after(),
            Some(Duration::from_secs(6))
        );
        assert_eq!(
            MessageKey::OtpSent.notice().dismiss_after(),
            Some(Duration::from_secs(4))
        );
    }

    #[test]
    fn test_severities() {
        assert_eq!(MessageKey::NetworkError.notice().severity, Severity::Error);
        assert_eq!(MessageKey::SignupSuccess.notice().severity, Severity::Success);
        assert_eq!(MessageKey::EmptyTournaments.notice().severity, Severity::Info);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(MessageKey::DuplicatePhone.to_string(), "duplicate_phone");
        assert_eq!(
            serde_json::to_string(&MessageKey::OtpResendLocked).unwrap(),
            "\"otp_resend_locked\""
        );
    }
}
