use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use task_local_extensions::Extensions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logs every request going out and every response coming back.
///
/// Header values marked sensitive (the bearer token) print as `Sensitive`.
#[derive(Debug)]
pub(crate) struct LogRequestsMiddleware;

#[async_trait::async_trait]
impl Middleware for LogRequestsMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        tracing::info!(
            url = %req.url(),
            method = %req.method(),
            headers = ?req.headers(),
            "Running request"
        );
        match next.run(req, extensions).await {
            Ok(resp) => {
                let status = resp.status();
                let content_length = resp.content_length();
                if status.is_client_error() {
                    tracing::warn!(?status, url = %resp.url(), "Client error on response");
                } else if status.is_server_error() {
                    tracing::error!(?status, url = %resp.url(), "Server error on response");
                } else {
                    tracing::info!(?status, ?content_length, "Got response");
                }
                Ok(resp)
            }
            Err(e) => {
                tracing::error!(%e, "Request failed");
                Err(e)
            }
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG`
pub fn setup_tracing(ansi: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(ansi)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::from_default_env())
        .init();
}
