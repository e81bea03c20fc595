//! Payment processor lookups.
//!
//! [`PaymentProcessor`] is the seam the download route depends on;
//! [`StripeClient`] is the production implementation.

use std::future::Future;
use std::time::Duration;

use crate::session::{CheckoutSession, SessionId};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Fixed timeout for the session lookup. A timeout counts as a failed verification.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a session lookup that reached the processor.
#[derive(Debug, Clone)]
pub enum SessionLookup {
    Found(CheckoutSession),
    /// Processor answered with a non-success status
    NotFound { status: u16 },
}

/// The processor could not be asked, or its answer could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("processor request failed: {0}")]
    Transport(String),

    #[error("processor response parse failed: {0}")]
    Decode(String),
}

/// Retrieves checkout sessions by id.
pub trait PaymentProcessor: Send + Sync {
    fn retrieve_session(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<SessionLookup, ProcessorError>> + Send;
}

/// Stripe Checkout Sessions API client.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl StripeClient {
    pub fn new(api_base: &str, secret_key: &str) -> Result<Self, ProcessorError> {
        let http = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProcessorError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    fn session_url(&self, id: &SessionId) -> String {
        format!("{}/v1/checkout/sessions/{}", self.api_base, id.as_str())
    }
}

impl PaymentProcessor for StripeClient {
    async fn retrieve_session(&self, id: &SessionId) -> Result<SessionLookup, ProcessorError> {
        let resp = self
            .http
            .get(self.session_url(id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ProcessorError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), session_mode = id.mode(), "session lookup rejected");
            return Ok(SessionLookup::NotFound {
                status: status.as_u16(),
            });
        }

        resp.json::<CheckoutSession>()
            .await
            .map(SessionLookup::Found)
            .map_err(|e| ProcessorError::Decode(e.to_string()))
    }
}
