//! The flows of the client, one module per area of the REST API.
//!
//! Every flow goes through [`ApiClient`], which in turn sends authenticated
//! requests through the [`Session`] middleware stack.

use crate::{
    error::{ApiError, ApiResult},
    session::Session,
    settings::Settings,
};
use arena_core::rejection::{field_rejections, rejection_keys};
use reqwest::{Method, Response, StatusCode};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde_json::Value;
use url::Url;

mod auth;
mod otp;
mod profile;
mod tournaments;
mod wallet;

pub use auth::{SEND_OTP_PATH, SIGNUP_PATH, VERIFY_OTP_PATH};
pub use otp::{OtpController, OtpProgress};
pub use profile::PROFILE_PATHS;
pub use tournaments::{TournamentListing, TOURNAMENTS_PATH};
pub use wallet::WALLET_PATHS;

/// Entry point of every flow. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    endpoint: Url,
    session: Session,
    public: ClientWithMiddleware,
    authenticated: ClientWithMiddleware,
}

impl ApiClient {
    /// Client for the server at `settings.api_endpoint`
    pub fn new(settings: &Settings, session: Session) -> Self {
        Self {
            endpoint: settings.api_endpoint.clone(),
            public: session.public_client(),
            authenticated: session.authenticated_client(),
            session,
        }
    }

    /// The session this client acts for
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(path);
        url
    }

    /// Request that goes out without a token
    fn public_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.public.request(method, self.url(path))
    }

    /// Request that carries the session's token and survives one expiry
    fn server_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authenticated.request(method, self.url(path))
    }

    /// Turn non-success responses into errors.
    ///
    /// A 401 that reaches a flow means the session is unusable, so it
    /// ends the session. Field errors of a 400 become notices.
    async fn expect_success(&self, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                if self.session.is_authenticated() {
                    self.session.logout();
                }
                Err(ApiError::Authentication)
            }
            StatusCode::BAD_REQUEST => {
                let body = response.json::<Value>().await.unwrap_or(Value::Null);
                let rejections = field_rejections(&body);
                if rejections.is_empty() {
                    tracing::info!(%body, "Request rejected");
                }
                for rejection in &rejections {
                    tracing::info!(
                        field = %rejection.field,
                        messages = ?rejection.messages,
                        key = %rejection.key,
                        "Field rejected"
                    );
                }
                Err(ApiError::Rejected(rejection_keys(&rejections)))
            }
            status => Err(ApiError::Unexpected {
                status: Some(status),
                detail: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// [`Self::expect_success`] for requests sent with `server_request`.
    ///
    /// A 401 to a request that went out with a session means the session
    /// expired and couldn't be refreshed.
    async fn expect_authorized(&self, response: Response, had_session: bool) -> ApiResult<Response> {
        if had_session && response.status() == StatusCode::UNAUTHORIZED {
            if self.session.is_authenticated() {
                self.session.logout();
            }
            tracing::info!(url = %response.url(), "Session expired");
            return Err(ApiError::SessionExpired);
        }
        self.expect_success(response).await
    }

    /// GET the first of `paths` that exists
    async fn get_first_found(&self, paths: &[&str]) -> ApiResult<Response> {
        for path in paths {
            let had_session = self.session.is_authenticated();
            let response = self.server_request(Method::GET, path).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                tracing::debug!(path, "Not found, trying the next path");
                continue;
            }
            return self.expect_authorized(response, had_session).await;
        }

        Err(ApiError::Unexpected {
            status: Some(StatusCode::NOT_FOUND),
            detail: format!("None of {paths:?} exist"),
        })
    }
}
