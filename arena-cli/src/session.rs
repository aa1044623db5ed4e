//! The session manager.
//!
//! [`Session`] exclusively owns the session keys in [`Storage`]: the token
//! pair, the cached profile and the pending one-time code context. It
//! provides the authenticated request primitive every flow goes through:
//! attach the bearer token, and on a 401 refresh the access token once and
//! retry the request once.
//!
//! Concurrent requests that all get a 401 each refresh on their own; the
//! last access token written wins.

use crate::{
    error::{ApiError, ApiResult},
    logging::LogRequestsMiddleware,
    navigation::{Location, Navigator},
    settings::Settings,
    storage::{keys, Storage, StorageExt},
};
use arena_core::{
    common::{RefreshRequest, RefreshResponse, TokenPair, UserProfile},
    otp::{OtpContext, OtpPurpose},
    token::is_token_valid,
};
use reqwest::{
    header::{HeaderValue, AUTHORIZATION},
    Client, Request, Response, StatusCode,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use std::sync::Arc;
use task_local_extensions::Extensions;
use url::Url;

/// Path of the token refresh endpoint
pub const REFRESH_PATH: &str = "/auth/jwt/refresh/";

/// Every key cleared on logout
const SESSION_KEYS: [&str; 6] = [
    keys::ACCESS_TOKEN,
    keys::REFRESH_TOKEN,
    keys::USER_DATA,
    keys::OTP_PURPOSE,
    keys::OTP_IDENTIFIER,
    keys::LEGACY_TOKEN,
];

/// Handle on the current session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    client: Client,
    refresh_url: Url,
}

impl Session {
    /// Set up a session on top of `storage`, sending redirects to `navigator`.
    pub fn new(
        settings: &Settings,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        let mut refresh_url = settings.api_endpoint.clone();
        refresh_url.set_path(REFRESH_PATH);

        Ok(Self {
            inner: Arc::new(SessionInner {
                storage,
                navigator,
                client,
                refresh_url,
            }),
        })
    }

    /// Client for endpoints that don't need a session. Only logs.
    pub fn public_client(&self) -> ClientWithMiddleware {
        ClientBuilder::new(self.inner.client.clone())
            .with(LogRequestsMiddleware)
            .build()
    }

    /// Client that sends the bearer token and refreshes it on a 401.
    pub fn authenticated_client(&self) -> ClientWithMiddleware {
        ClientBuilder::new(self.inner.client.clone())
            .with(SessionMiddleware {
                session: self.clone(),
            })
            .with(LogRequestsMiddleware)
            .build()
    }

    /// Send `request` with the bearer token, refreshing and retrying once
    /// on a 401. Failed refreshes hand back the original 401 response.
    pub async fn authenticated_fetch(
        &self,
        request: Request,
    ) -> reqwest_middleware::Result<Response> {
        self.authenticated_client().execute(request).await
    }

    /// Where redirects go
    pub fn navigator(&self) -> &dyn Navigator {
        self.inner.navigator.as_ref()
    }

    /// Whether a non-empty access token is stored.
    /// Neither its shape nor its expiry are checked.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// The stored access token, if non-empty
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .storage
            .get(keys::ACCESS_TOKEN)
            .filter(|token| !token.is_empty())
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner
            .storage
            .get(keys::REFRESH_TOKEN)
            .filter(|token| !token.is_empty())
    }

    /// Gate for protected flows. A missing or malformed access token
    /// logs out and fails.
    pub fn require_authenticated(&self) -> ApiResult<()> {
        match self.access_token() {
            Some(token) if is_token_valid(&token) => Ok(()),
            Some(_) => {
                tracing::warn!("Stored access token is malformed, logging out");
                self.logout();
                Err(ApiError::Authentication)
            }
            None => {
                tracing::info!("No access token stored, logging out");
                self.logout();
                Err(ApiError::Authentication)
            }
        }
    }

    /// Store a freshly issued token pair. Both tokens are written together.
    pub fn store_tokens(&self, tokens: &TokenPair) {
        let storage = &self.inner.storage;
        storage.set(keys::ACCESS_TOKEN, &tokens.access);
        storage.set(keys::REFRESH_TOKEN, &tokens.refresh);
        tracing::info!("Stored new session tokens");
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Without a stored refresh token this logs out right away, without a
    /// request. Any failure (status, network, unreadable body) logs out too.
    /// The refresh token itself is kept as is.
    pub async fn refresh_access_token(&self) -> Option<String> {
        let Some(refresh) = self.refresh_token() else {
            tracing::info!("No refresh token stored, logging out");
            self.logout();
            return None;
        };

        match self.request_refresh(refresh).await {
            Ok(access) => {
                self.inner.storage.set(keys::ACCESS_TOKEN, &access);
                tracing::info!("Access token refreshed");
                Some(access)
            }
            Err(e) => {
                tracing::warn!(%e, "Refreshing the access token failed, logging out");
                self.logout();
                None
            }
        }
    }

    async fn request_refresh(&self, refresh: String) -> ApiResult<String> {
        let response = self
            .public_client()
            .post(self.inner.refresh_url.clone())
            .json(&RefreshRequest { refresh })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Unexpected {
                status: Some(status),
                detail: "Refresh token rejected".to_string(),
            });
        }

        let RefreshResponse { access } = response.json().await?;
        if access.is_empty() {
            return Err(ApiError::Unexpected {
                status: Some(status),
                detail: "Empty access token in refresh response".to_string(),
            });
        }
        Ok(access)
    }

    /// Clear every session key and redirect to the login entry point.
    pub fn logout(&self) {
        for key in SESSION_KEYS {
            self.inner.storage.remove(key);
        }
        tracing::info!("Session cleared");
        self.inner.navigator.navigate(Location::Login);
    }

    /// The cached profile, read without touching the network
    pub fn cached_profile(&self) -> Option<UserProfile> {
        self.inner.storage.get_json(keys::USER_DATA)
    }

    /// Replace the cached profile
    pub fn cache_profile(&self, profile: &UserProfile) {
        self.inner.storage.set_json(keys::USER_DATA, profile);
    }

    /// The stored pending verification, if complete and readable
    pub fn pending_otp(&self) -> Option<OtpContext> {
        let storage = &self.inner.storage;
        let purpose = storage.get(keys::OTP_PURPOSE)?;
        let identifier = storage.get(keys::OTP_IDENTIFIER)?;

        match purpose.parse::<OtpPurpose>() {
            Ok(purpose) => Some(OtpContext::new(purpose, identifier)),
            Err(e) => {
                tracing::warn!(%e, "Ignoring stored verification context");
                None
            }
        }
    }

    /// Remember a pending verification
    pub fn set_pending_otp(&self, context: &OtpContext) {
        let storage = &self.inner.storage;
        storage.set(keys::OTP_PURPOSE, context.purpose.as_str());
        storage.set(keys::OTP_IDENTIFIER, &context.identifier);
    }

    /// Forget the pending verification
    pub fn clear_pending_otp(&self) {
        let storage = &self.inner.storage;
        storage.remove(keys::OTP_PURPOSE);
        storage.remove(keys::OTP_IDENTIFIER);
    }

    fn authorize(&self, mut req: Request, token: &str) -> Request {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                req.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(e) => {
                tracing::warn!(%e, "Access token can't be sent as a header, sending without");
            }
        }
        req
    }
}

/// Attaches the bearer token; on a 401 refreshes once and retries once.
#[derive(Debug)]
struct SessionMiddleware {
    session: Session,
}

#[async_trait::async_trait]
impl Middleware for SessionMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        // Streaming bodies can't be cloned; those requests just aren't retried
        let retry = req.try_clone();

        let req = match self.session.access_token() {
            Some(token) => self.session.authorize(req, &token),
            None => req,
        };

        let response = next.clone().run(req, extensions).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!(url = %response.url(), "Request unauthorized, refreshing access token");

        let Some(access) = self.session.refresh_access_token().await else {
            return Ok(response);
        };

        let Some(retry) = retry else {
            tracing::warn!(url = %response.url(), "Request can't be retried");
            return Ok(response);
        };

        tracing::info!(url = %retry.url(), "Retrying request with refreshed token");
        next.run(self.session.authorize(retry, &access), extensions)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{navigation::RecordingNavigator, storage::MemoryStorage};

    fn session() -> (Session, Arc<MemoryStorage>, Arc<RecordingNavigator>) {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let settings =
            Settings::for_endpoint(Url::parse("http://127.0.0.1:9").expect("valid url"));
        let session = Session::new(&settings, storage.clone(), navigator.clone())
            .expect("client builds");
        (session, storage, navigator)
    }

    fn tokens() -> TokenPair {
        TokenPair {
            access: "aaa.bbb.ccc".to_string(),
            refresh: "ddd.eee.fff".to_string(),
        }
    }

    #[test]
    fn test_is_authenticated_needs_non_empty_token() {
        let (session, storage, _) = session();
        assert!(!session.is_authenticated());

        storage.set(keys::ACCESS_TOKEN, "");
        assert!(!session.is_authenticated());

        session.store_tokens(&tokens());
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_store_tokens_writes_both() {
        let (session, storage, _) = session();
        session.store_tokens(&tokens());
        assert_eq!(storage.get(keys::ACCESS_TOKEN).as_deref(), Some("aaa.bbb.ccc"));
        assert_eq!(storage.get(keys::REFRESH_TOKEN).as_deref(), Some("ddd.eee.fff"));
    }

    #[test]
    fn test_logout_clears_everything() {
        let (session, storage, navigator) = session();
        session.store_tokens(&tokens());
        session.cache_profile(&UserProfile::default());
        session.set_pending_otp(&OtpContext::new(OtpPurpose::Login, "09123456789"));
        storage.set(keys::LEGACY_TOKEN, "old");
        storage.set("unrelated", "kept");

        session.logout();

        assert_eq!(storage.keys(), vec!["unrelated"]);
        assert_eq!(navigator.visited(), vec![Location::Login]);
    }

    #[test]
    fn test_malformed_token_is_logged_out() {
        let (session, storage, navigator) = session();
        storage.set(keys::ACCESS_TOKEN, "not-a-jwt");
        storage.set(keys::REFRESH_TOKEN, "ddd.eee.fff");

        assert!(session.is_authenticated());
        assert!(matches!(
            session.require_authenticated(),
            Err(ApiError::Authentication)
        ));
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(keys::REFRESH_TOKEN), None);
        assert_eq!(navigator.visited(), vec![Location::Login]);
    }

    #[test]
    fn test_well_formed_token_passes_gate() {
        let (session, _, navigator) = session();
        session.store_tokens(&tokens());
        assert!(session.require_authenticated().is_ok());
        assert!(navigator.visited().is_empty());
    }

    #[test]
    fn test_pending_otp() {
        let (session, storage, _) = session();
        assert_eq!(session.pending_otp(), None);

        let context = OtpContext::new(OtpPurpose::ResetPassword, "09123456789");
        session.set_pending_otp(&context);
        assert_eq!(session.pending_otp(), Some(context));

        storage.set(keys::OTP_PURPOSE, "bogus");
        assert_eq!(session.pending_otp(), None);

        session.clear_pending_otp();
        assert_eq!(storage.get(keys::OTP_IDENTIFIER), None);
    }

    #[test]
    fn test_cached_profile() {
        let (session, _, _) = session();
        assert_eq!(session.cached_profile(), None);

        let profile = UserProfile {
            username: Some("player1".to_string()),
            ..Default::default()
        };
        session.cache_profile(&profile);
        assert_eq!(session.cached_profile(), Some(profile));
    }

    #[test_log::test(tokio::test)]
    async fn test_refresh_without_refresh_token_logs_out_offline() {
        // The endpoint is unroutable; getting `None` without a request
        // attempt shows no network call was made.
        let (session, storage, navigator) = session();
        storage.set(keys::ACCESS_TOKEN, "aaa.bbb.ccc");

        assert_eq!(session.refresh_access_token().await, None);
        assert_eq!(storage.get(keys::ACCESS_TOKEN), None);
        assert_eq!(navigator.visited(), vec![Location::Login]);
    }
}
