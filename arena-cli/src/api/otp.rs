use super::ApiClient;
use crate::{
    error::{ApiError, ApiResult},
    navigation::Location,
};
use arena_core::{
    otp::{InputOutcome, OtpContext, OtpError, OtpFlow},
    validation::check_otp_code,
};
use std::time::{Duration, Instant};

/// What a piece of input led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpProgress {
    /// Accepted, more digits needed
    Pending,
    /// Dropped, e.g. a non-digit or input after verification
    Ignored,
    /// The code was verified and the session started
    Verified,
}

/// Drives an [`OtpFlow`] against the server.
///
/// A completed code is verified as soon as the last digit lands. The
/// resend lock starts when the controller opens.
#[derive(Debug)]
pub struct OtpController {
    api: ApiClient,
    flow: OtpFlow,
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl OtpController {
    /// Open the verification for `query`, or for the stored pending
    /// verification when there is no query.
    pub fn open(api: ApiClient, query: Option<OtpContext>) -> ApiResult<Self> {
        let mut flow = OtpFlow::new();
        flow.resolve(query, api.session.pending_otp())?;
        flow.start_resend_lock(now());
        Ok(Self { api, flow })
    }

    /// The underlying state machine
    pub fn flow(&self) -> &OtpFlow {
        &self.flow
    }

    /// What is being verified
    pub fn context(&self) -> Option<&OtpContext> {
        self.flow.context()
    }

    /// Time until a new code may be requested
    pub fn resend_remaining(&self) -> Duration {
        self.flow.resend_remaining(now())
    }

    /// Type one digit into cell `index`
    pub async fn enter_digit(&mut self, index: usize, input: char) -> ApiResult<OtpProgress> {
        let outcome = self.flow.enter_digit(index, input);
        self.proceed(outcome).await
    }

    /// Paste a whole code
    pub async fn paste(&mut self, text: &str) -> ApiResult<OtpProgress> {
        let outcome = self.flow.paste(text);
        self.proceed(outcome).await
    }

    /// Enter a whole typed code. Anything but exactly 6 digits is
    /// rejected here and never sent.
    pub async fn enter_code(&mut self, text: &str) -> ApiResult<OtpProgress> {
        let code = check_otp_code(text.trim()).map_err(ApiError::Validation)?;
        self.paste(&code).await
    }

    /// Submit what has been entered
    pub async fn submit(&mut self) -> ApiResult<OtpProgress> {
        let code = self.flow.submit()?;
        self.verify(code).await
    }

    /// Request a new code
    pub async fn resend(&mut self) -> ApiResult<()> {
        let identifier = self.flow.begin_resend(now())?.identifier.clone();

        match self.api.send_otp(&identifier).await {
            Ok(()) => {
                self.flow.resend_succeeded(now());
                Ok(())
            }
            Err(e) => {
                self.flow.resend_failed();
                Err(e)
            }
        }
    }

    async fn proceed(&mut self, outcome: InputOutcome) -> ApiResult<OtpProgress> {
        match outcome {
            InputOutcome::Pending => Ok(OtpProgress::Pending),
            InputOutcome::Ignored => Ok(OtpProgress::Ignored),
            InputOutcome::Submit(code) => self.verify(code).await,
        }
    }

    async fn verify(&mut self, code: String) -> ApiResult<OtpProgress> {
        let Some(context) = self.flow.context().cloned() else {
            self.flow.verification_failed();
            return Err(ApiError::Otp(OtpError::MissingContext));
        };

        if let Err(e) = self.api.verify_otp(&context, &code).await {
            self.flow.verification_failed();
            return Err(e);
        }
        self.flow.verification_succeeded();

        // The dashboard can do without a fresh profile
        if let Err(e) = self.api.fetch_profile().await {
            tracing::warn!(%e, "Couldn't fetch the profile after verification");
        }
        self.api.session.navigator().navigate(Location::Dashboard);

        Ok(OtpProgress::Verified)
    }
}
