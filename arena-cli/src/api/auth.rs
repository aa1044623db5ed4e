use super::ApiClient;
use crate::{
    error::{ApiError, ApiResult},
    navigation::Location,
};
use arena_core::{
    common::{SendOtpRequest, TokenPair, VerifyOtpRequest, VerifyOtpResponse},
    messages::MessageKey,
    otp::{OtpContext, OtpPurpose},
    validation::{PhoneForm, SignupForm},
};
use reqwest::Method;

/// Account creation
pub const SIGNUP_PATH: &str = "/api/users/users/";
/// Sends a one-time code to an identifier
pub const SEND_OTP_PATH: &str = "/api/users/users/send_otp/";
/// Exchanges a one-time code for a token pair
pub const VERIFY_OTP_PATH: &str = "/api/users/users/verify_otp/";

impl ApiClient {
    /// Create an account, then send its verification code.
    ///
    /// Invalid input fails before anything is sent. On success the pending
    /// verification is stored and the user is sent to the code page.
    pub async fn signup(&self, form: &SignupForm) -> ApiResult<OtpContext> {
        let request = form.check().map_err(ApiError::Validation)?;

        let response = self
            .public_request(Method::POST, SIGNUP_PATH)
            .json(&request)
            .send()
            .await?;
        self.expect_success(response).await?;
        tracing::info!("Account created");

        let context = OtpContext::new(OtpPurpose::Signup, request.phone_number);
        self.start_verification(context).await
    }

    /// Start a login or password reset by sending a code to the phone.
    pub async fn request_otp(&self, purpose: OtpPurpose, form: &PhoneForm) -> ApiResult<OtpContext> {
        let request = form.check().map_err(ApiError::Validation)?;
        self.start_verification(OtpContext::new(purpose, request.identifier))
            .await
    }

    /// The pending verification is stored before the code is sent, so a
    /// failed send can still be retried with a resend.
    async fn start_verification(&self, context: OtpContext) -> ApiResult<OtpContext> {
        self.session.set_pending_otp(&context);
        self.send_otp(&context.identifier).await?;
        self.session
            .navigator()
            .navigate(Location::OtpVerification(context.clone()));
        Ok(context)
    }

    /// Send a (new) code to `identifier`
    pub async fn send_otp(&self, identifier: &str) -> ApiResult<()> {
        let response = self
            .public_request(Method::POST, SEND_OTP_PATH)
            .json(&SendOtpRequest {
                identifier: identifier.to_string(),
            })
            .send()
            .await?;
        self.expect_success(response).await?;
        tracing::info!("Verification code sent");
        Ok(())
    }

    /// Verify `code` for the pending verification.
    ///
    /// On success the issued tokens become the session and the pending
    /// verification is forgotten. Any client error means the code was
    /// rejected.
    pub async fn verify_otp(&self, context: &OtpContext, code: &str) -> ApiResult<TokenPair> {
        let response = self
            .public_request(Method::POST, VERIFY_OTP_PATH)
            .json(&VerifyOtpRequest {
                identifier: context.identifier.clone(),
                code: code.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            tracing::info!(?status, purpose = %context.purpose, "Code rejected");
            return Err(ApiError::Rejected(vec![MessageKey::OtpRejected]));
        }

        let tokens = self
            .expect_success(response)
            .await?
            .json::<VerifyOtpResponse>()
            .await?
            .into_tokens();

        self.session.store_tokens(&tokens);
        self.session.clear_pending_otp();
        tracing::info!(purpose = %context.purpose, "Code verified");
        Ok(tokens)
    }
}
