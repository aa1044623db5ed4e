use super::ApiClient;
use crate::error::ApiResult;
use arena_core::common::UserProfile;

/// Where the profile may live, tried in order until one isn't a 404
pub const PROFILE_PATHS: [&str; 3] = [
    "/api/auth/users/me",
    "/api/auth/users/me/",
    "/api/users/users/me/",
];

impl ApiClient {
    /// The last profile fetched, without a request
    pub fn cached_profile(&self) -> Option<UserProfile> {
        self.session.cached_profile()
    }

    /// Fetch the signed-in user's profile and cache it
    pub async fn fetch_profile(&self) -> ApiResult<UserProfile> {
        self.session.require_authenticated()?;

        let profile: UserProfile = self.get_first_found(&PROFILE_PATHS).await?.json().await?;
        self.session.cache_profile(&profile);
        tracing::debug!(username = ?profile.username, "Fetched profile");

        Ok(profile)
    }
}
