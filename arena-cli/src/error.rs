//! Errors of the API flows and their user-facing notices

use arena_core::{
    messages::{MessageKey, Notice},
    otp::OtpError,
};
use reqwest::StatusCode;

/// Standard return type of the API flows
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Why a flow failed
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable session, or the server rejected it
    #[error("Not signed in, or the session was rejected")]
    Authentication,

    /// The session was rejected and couldn't be refreshed
    #[error("The session expired")]
    SessionExpired,

    /// The request never got a response (unreachable, timed out, ...)
    #[error("Network error: {0}")]
    Network(#[source] reqwest_middleware::Error),

    /// Local validation failed; nothing was sent
    #[error("Invalid input: {0}")]
    Validation(MessageKey),

    /// The server rejected the input (HTTP 400)
    #[error("Rejected by the server: {0:?}")]
    Rejected(Vec<MessageKey>),

    /// Verification flow error
    #[error(transparent)]
    Otp(#[from] OtpError),

    /// Anything the flows don't know how to handle
    #[error("Unexpected response{}: {detail}", .status.map(|s| format!(" (status code {s})")).unwrap_or_default())]
    Unexpected {
        /// Status of the response, if there was one
        status: Option<StatusCode>,
        /// What went wrong
        detail: String,
    },
}

impl ApiError {
    /// The notices to show for this error
    pub fn notices(&self) -> Vec<Notice> {
        match self {
            ApiError::Authentication => vec![MessageKey::LoginRequired.notice()],
            ApiError::SessionExpired => vec![MessageKey::SessionExpired.notice()],
            ApiError::Network(_) => vec![MessageKey::NetworkError.notice()],
            ApiError::Validation(key) => vec![key.notice()],
            ApiError::Rejected(keys) => keys.iter().map(|key| key.notice()).collect(),
            ApiError::Otp(OtpError::ResendLocked(remaining)) => vec![MessageKey::OtpResendLocked
                .notice()
                .fill("seconds", remaining.as_secs())],
            ApiError::Otp(OtpError::IncompleteCode) => vec![MessageKey::InvalidOtp.notice()],
            ApiError::Otp(OtpError::MissingContext | OtpError::UnknownPurpose(_)) => {
                vec![MessageKey::OtpContextMissing.notice()]
            }
            ApiError::Otp(_) | ApiError::Unexpected { .. } => {
                vec![MessageKey::GenericError.notice()]
            }
        }
    }
}

impl From<reqwest_middleware::Error> for ApiError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => Self::from(err),
            err => Self::Network(err),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Unexpected {
                status: err.status(),
                detail: err.to_string(),
            }
        } else {
            Self::Network(reqwest_middleware::Error::Reqwest(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_resend_locked_notice_has_seconds() {
        let notices =
            ApiError::Otp(OtpError::ResendLocked(Duration::from_secs(17))).notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].key, MessageKey::OtpResendLocked);
        assert!(notices[0].body.contains("17"));
    }

    #[test]
    fn test_rejected_maps_every_key() {
        let keys: Vec<_> = ApiError::Rejected(vec![
            MessageKey::DuplicatePhone,
            MessageKey::WeakPassword,
        ])
        .notices()
        .into_iter()
        .map(|notice| notice.key)
        .collect();
        assert_eq!(keys, vec![MessageKey::DuplicatePhone, MessageKey::WeakPassword]);
    }

    #[test]
    fn test_unexpected_display() {
        let err = ApiError::Unexpected {
            status: Some(StatusCode::BAD_GATEWAY),
            detail: "upstream down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected response (status code 502 Bad Gateway): upstream down"
        );
        assert_eq!(err.notices()[0].key, MessageKey::GenericError);
    }
}
