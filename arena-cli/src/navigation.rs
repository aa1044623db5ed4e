//! Where the client sends the user next.
//!
//! The session and the flows don't print or prompt; they hand a
//! [`Location`] to a [`Navigator`] and carry on.

use arena_core::otp::OtpContext;
use parking_lot::Mutex;
use std::fmt::Debug;
use url::form_urlencoded;

/// Fixed path of the login entry point
pub const LOGIN_PATH: &str = "/login/";
/// Fixed path of the one-time code verification page
pub const OTP_PATH: &str = "/otp/";
/// Fixed path of the user dashboard
pub const DASHBOARD_PATH: &str = "/dashboard/";

/// A destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// The login entry point
    Login,
    /// Code verification for a pending signup, login or reset
    OtpVerification(OtpContext),
    /// The signed-in user's dashboard
    Dashboard,
}

impl Location {
    /// The path (and query) of this location
    pub fn path(&self) -> String {
        match self {
            Location::Login => LOGIN_PATH.to_string(),
            Location::Dashboard => DASHBOARD_PATH.to_string(),
            Location::OtpVerification(context) => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("purpose", context.purpose.as_str())
                    .append_pair("identifier", &context.identifier)
                    .finish();
                format!("{OTP_PATH}?{query}")
            }
        }
    }
}

/// Receives redirects
pub trait Navigator: Send + Sync + Debug {
    /// Go to `location`
    fn navigate(&self, location: Location);
}

/// Tells the user on stderr which command to run next
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, location: Location) {
        tracing::info!(path = %location.path(), "Navigating");
        match location {
            Location::Login => {
                eprintln!("Please sign in again: arena-cli auth login");
            }
            Location::OtpVerification(context) => {
                eprintln!(
                    "Verify the code sent to {}: arena-cli auth verify --purpose {} --identifier {}",
                    context.identifier, context.purpose, context.identifier
                );
            }
            Location::Dashboard => {}
        }
    }
}

/// Keeps every location it was sent to
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Location>>,
}

impl RecordingNavigator {
    /// Nothing visited yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Every location visited, in order
    pub fn visited(&self) -> Vec<Location> {
        self.visited.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, location: Location) {
        self.visited.lock().push(location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::otp::OtpPurpose;

    #[test]
    fn test_otp_location_carries_query() {
        let location =
            Location::OtpVerification(OtpContext::new(OtpPurpose::Signup, "09123456789"));
        assert_eq!(
            location.path(),
            "/otp/?purpose=signup&identifier=09123456789"
        );
    }

    #[test]
    fn test_identifier_is_encoded() {
        let location =
            Location::OtpVerification(OtpContext::new(OtpPurpose::Login, "a b@example.test"));
        assert_eq!(
            location.path(),
            "/otp/?purpose=login&identifier=a+b%40example.test"
        );
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        navigator.navigate(Location::Login);
        navigator.navigate(Location::Dashboard);
        assert_eq!(navigator.visited(), vec![Location::Login, Location::Dashboard]);
    }
}
