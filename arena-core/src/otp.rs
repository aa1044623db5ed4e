//! The one-time code verification state machine.
//!
//! [`OtpFlow`] only tracks state; sending codes and verifying them is up
//! to the caller, which reports outcomes back through the
//! `*_succeeded`/`*_failed` methods. Time is passed in explicitly so the
//! resend lock can be driven by any clock.

use crate::validation::normalize_digit;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

/// Number of digits in a one-time code
pub const OTP_LENGTH: usize = 6;

/// How long resending a code stays locked after a code was sent
pub const RESEND_COOLDOWN: Duration = Duration::from_secs(120);

/// Why a code was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    /// Verifying a freshly created account
    Signup,
    /// Logging into an existing account
    Login,
    /// Recovering an account
    ResetPassword,
}

impl OtpPurpose {
    /// The wire / storage name of the purpose
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Signup => "signup",
            OtpPurpose::Login => "login",
            OtpPurpose::ResetPassword => "reset_password",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(OtpPurpose::Signup),
            "login" => Ok(OtpPurpose::Login),
            "reset_password" | "reset" => Ok(OtpPurpose::ResetPassword),
            other => Err(OtpError::UnknownPurpose(other.to_string())),
        }
    }
}

/// The pending verification: what the code is for and where it was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpContext {
    /// Why the code was requested
    pub purpose: OtpPurpose,
    /// Phone number (or email) the code was sent to
    pub identifier: String,
}

impl OtpContext {
    /// Construct a new context
    pub fn new(purpose: OtpPurpose, identifier: impl Into<String>) -> Self {
        Self {
            purpose,
            identifier: identifier.into(),
        }
    }
}

/// States of the verification flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpState {
    /// Nothing resolved yet
    Idle,
    /// Context known, waiting for digits
    AwaitingInput,
    /// A verification request is in flight
    Submitting,
    /// The code was accepted
    Verified,
    /// The last verification attempt was rejected
    Failed,
}

/// Errors of the verification flow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    /// Neither the query nor storage had a pending verification
    #[error("No pending verification, start from signup or login")]
    MissingContext,
    /// The stored purpose isn't one we know
    #[error("Unknown verification purpose: {0}")]
    UnknownPurpose(String),
    /// Submitted before all digits were entered
    #[error("The code must be exactly 6 digits")]
    IncompleteCode,
    /// Another verification or resend request is in flight
    #[error("Another request is already in flight")]
    Busy,
    /// Resend is still locked
    #[error("Resending is locked for another {} seconds", .0.as_secs())]
    ResendLocked(Duration),
    /// The operation doesn't apply to the current state
    #[error("Not possible while {0:?}")]
    InvalidState(OtpState),
}

/// Result of feeding input into the cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Input accepted, the code is not complete yet
    Pending,
    /// The code is complete; the flow moved to [`OtpState::Submitting`]
    /// and the caller must now verify this code
    Submit(String),
    /// Input was dropped (busy, wrong state or not a digit)
    Ignored,
}

/// The verification flow
#[derive(Debug, Clone)]
pub struct OtpFlow {
    state: OtpState,
    context: Option<OtpContext>,
    cells: [Option<char>; OTP_LENGTH],
    resend_in_flight: bool,
    resend_locked_until: Option<Instant>,
}

impl Default for OtpFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl OtpFlow {
    /// A fresh, idle flow
    pub fn new() -> Self {
        Self {
            state: OtpState::Idle,
            context: None,
            cells: [None; OTP_LENGTH],
            resend_in_flight: false,
            resend_locked_until: None,
        }
    }

    /// Current state
    pub fn state(&self) -> OtpState {
        self.state
    }

    /// The resolved context, if any
    pub fn context(&self) -> Option<&OtpContext> {
        self.context.as_ref()
    }

    /// The digits entered so far, in cell order
    pub fn code(&self) -> String {
        self.cells.iter().flatten().collect()
    }

    /// Whether a verification or resend request is in flight
    pub fn is_busy(&self) -> bool {
        self.state == OtpState::Submitting || self.resend_in_flight
    }

    /// Resolve what is being verified. The query wins over what's stored.
    pub fn resolve(
        &mut self,
        query: Option<OtpContext>,
        stored: Option<OtpContext>,
    ) -> Result<&OtpContext, OtpError> {
        if self.state != OtpState::Idle {
            return Err(OtpError::InvalidState(self.state));
        }

        let context = query.or(stored).ok_or(OtpError::MissingContext)?;
        tracing::debug!(purpose = %context.purpose, "Resolved pending verification");

        self.state = OtpState::AwaitingInput;
        let context = &*self.context.insert(context);
        Ok(context)
    }

    /// Type a character into one cell. Non-digits are ignored.
    pub fn enter_digit(&mut self, index: usize, input: char) -> InputOutcome {
        if index >= OTP_LENGTH || !self.accepts_input() {
            return InputOutcome::Ignored;
        }

        let digit = normalize_digit(input);
        if !digit.is_ascii_digit() {
            return InputOutcome::Ignored;
        }

        self.state = OtpState::AwaitingInput;
        self.cells[index] = Some(digit);
        self.auto_submit()
    }

    /// Paste text across the cells, starting at the first one.
    ///
    /// Non-digits are skipped, surplus digits are dropped and cells past
    /// the pasted digits are cleared.
    pub fn paste(&mut self, text: &str) -> InputOutcome {
        if !self.accepts_input() {
            return InputOutcome::Ignored;
        }

        let digits: Vec<char> = text
            .chars()
            .map(normalize_digit)
            .filter(char::is_ascii_digit)
            .take(OTP_LENGTH)
            .collect();

        if digits.is_empty() {
            return InputOutcome::Ignored;
        }

        self.state = OtpState::AwaitingInput;
        for (i, cell) in self.cells.iter_mut().enumerate() {
            *cell = digits.get(i).copied();
        }
        self.auto_submit()
    }

    /// Explicit form submission.
    pub fn submit(&mut self) -> Result<String, OtpError> {
        if self.is_busy() {
            return Err(OtpError::Busy);
        }
        if !self.accepts_input() {
            return Err(OtpError::InvalidState(self.state));
        }
        if !self.is_complete() {
            return Err(OtpError::IncompleteCode);
        }

        self.state = OtpState::Submitting;
        Ok(self.code())
    }

    /// The server accepted the code
    pub fn verification_succeeded(&mut self) {
        if self.state == OtpState::Submitting {
            self.state = OtpState::Verified;
            self.resend_locked_until = None;
        }
    }

    /// The server rejected the code, or the request failed.
    /// The cells keep their digits.
    pub fn verification_failed(&mut self) {
        if self.state == OtpState::Submitting {
            self.state = OtpState::Failed;
        }
    }

    /// Start the resend lock, e.g. right after the first code was sent.
    pub fn start_resend_lock(&mut self, now: Instant) {
        self.resend_locked_until = Some(now + RESEND_COOLDOWN);
    }

    /// Drop the resend lock. Called on teardown.
    pub fn cancel_resend_lock(&mut self) {
        self.resend_locked_until = None;
    }

    /// Time left until a resend is allowed
    pub fn resend_remaining(&self, now: Instant) -> Duration {
        self.resend_locked_until
            .map_or(Duration::ZERO, |until| until.saturating_duration_since(now))
    }

    /// Ask to resend the code. On `Ok` the caller must send it and report
    /// back with [`Self::resend_succeeded`] or [`Self::resend_failed`].
    pub fn begin_resend(&mut self, now: Instant) -> Result<&OtpContext, OtpError> {
        if self.is_busy() {
            return Err(OtpError::Busy);
        }
        if !self.accepts_input() {
            return Err(OtpError::InvalidState(self.state));
        }

        let remaining = self.resend_remaining(now);
        if !remaining.is_zero() {
            // Round up, "0 seconds left" while still locked reads wrong
            let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return Err(OtpError::ResendLocked(Duration::from_secs(secs)));
        }

        self.resend_in_flight = true;
        self.context.as_ref().ok_or(OtpError::MissingContext)
    }

    /// A new code went out: clear the cells and restart the lock
    pub fn resend_succeeded(&mut self, now: Instant) {
        self.resend_in_flight = false;
        self.cells = [None; OTP_LENGTH];
        self.state = OtpState::AwaitingInput;
        self.start_resend_lock(now);
    }

    /// Sending a new code failed; nothing changes except the busy flag
    pub fn resend_failed(&mut self) {
        self.resend_in_flight = false;
    }

    fn accepts_input(&self) -> bool {
        !self.resend_in_flight
            && matches!(self.state, OtpState::AwaitingInput | OtpState::Failed)
    }

    fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    fn auto_submit(&mut self) -> InputOutcome {
        if self.is_complete() {
            self.state = OtpState::Submitting;
            InputOutcome::Submit(self.code())
        } else {
            InputOutcome::Pending
        }
    }
}
