//! Checkout session identifiers and the processor's view of a session.

use serde::Deserialize;
use std::fmt;

use crate::error::DownloadError;

const TEST_PREFIX: &str = "cs_test_";
const LIVE_PREFIX: &str = "cs_live_";
const MIN_SUFFIX_LEN: usize = 10;

/// A syntactically valid checkout session id (`cs_test_…` / `cs_live_…`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    /// Accepts exactly `^cs_(test|live)_[A-Za-z0-9]{10,}$`.
    pub fn parse(raw: &str) -> Result<Self, DownloadError> {
        let suffix = raw
            .strip_prefix(TEST_PREFIX)
            .or_else(|| raw.strip_prefix(LIVE_PREFIX))
            .ok_or(DownloadError::InvalidSession)?;

        if suffix.len() < MIN_SUFFIX_LEN || !suffix.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(DownloadError::InvalidSession);
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_live(&self) -> bool {
        self.0.starts_with(LIVE_PREFIX)
    }

    /// "live" or "test", for logs.
    pub fn mode(&self) -> &'static str {
        if self.is_live() {
            "live"
        } else {
            "test"
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side metadata attached to the session at checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub product_slug: Option<String>,
}

/// The subset of the processor's checkout session record the gate reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    #[serde(default)]
    pub id: Option<String>,
    pub payment_status: String,
    #[serde(default)]
    pub metadata: Option<SessionMetadata>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// Product slug recorded at checkout, ignoring empty values.
    pub fn product_slug(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.product_slug.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Pick the slug to serve. The session's own metadata wins over the query
/// parameter so a buyer cannot swap in a different product after paying.
pub fn effective_slug<'a>(session: &'a CheckoutSession, requested: Option<&'a str>) -> &'a str {
    session
        .product_slug()
        .or(requested)
        .unwrap_or_default()
}
