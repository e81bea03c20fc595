use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

/// Terminal failures of a download request. Each maps to exactly one status.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Session id missing or not of the form `cs_(test|live)_<10+ alphanumerics>`
    #[error("invalid session id")]
    InvalidSession,

    /// Processor answered the lookup with a non-success status
    #[error("session not found (processor status {0})")]
    SessionNotFound(u16),

    /// Processor could not be reached or returned an unreadable record
    #[error("payment verification failed: {0}")]
    VerificationFailed(String),

    /// Session exists but its payment_status is not "paid"
    #[error("payment not completed (status {0:?})")]
    PaymentIncomplete(String),

    /// Effective slug empty or absent from the catalog
    #[error("unknown product {slug:?}")]
    UnknownProduct {
        slug: String,
        available: Vec<&'static str>,
    },

    /// Storage has no object under the resolved key
    #[error("product file not found: {0}")]
    ProductNotFound(String),

    /// Storage backend failed for a reason other than absence
    #[error("storage error: {0}")]
    StorageUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<&'a [&'static str]>,
}

impl DownloadError {
    /// Client-facing message. Internal detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            DownloadError::InvalidSession => "Invalid session ID",
            DownloadError::SessionNotFound(_) => "Session not found",
            DownloadError::VerificationFailed(_) => "Failed to verify payment",
            DownloadError::PaymentIncomplete(_) => "Payment not completed",
            DownloadError::UnknownProduct { .. } => "Invalid product",
            DownloadError::ProductNotFound(_) => "Product file not found",
            DownloadError::StorageUnavailable(_) => "Storage error",
        }
    }

    /// Label used for the `outcome` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            DownloadError::InvalidSession => "invalid_session",
            DownloadError::SessionNotFound(_) => "session_not_found",
            DownloadError::VerificationFailed(_) => "verification_failed",
            DownloadError::PaymentIncomplete(_) => "payment_incomplete",
            DownloadError::UnknownProduct { .. } => "unknown_product",
            DownloadError::ProductNotFound(_) => "product_not_found",
            DownloadError::StorageUnavailable(_) => "storage_error",
        }
    }

    /// Render the error. Metadata-only (HEAD) checks get the status with an empty body.
    pub fn to_response(&self, metadata_only: bool) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if metadata_only {
            return builder.finish();
        }

        let available = match self {
            DownloadError::UnknownProduct { available, .. } => Some(available.as_slice()),
            _ => None,
        };
        builder.json(ErrorBody {
            error: self.public_message(),
            available,
        })
    }
}

impl ResponseError for DownloadError {
    fn status_code(&self) -> StatusCode {
        match self {
            DownloadError::InvalidSession | DownloadError::UnknownProduct { .. } => {
                StatusCode::BAD_REQUEST
            }
            DownloadError::SessionNotFound(_) => StatusCode::FORBIDDEN,
            DownloadError::PaymentIncomplete(_) => StatusCode::PAYMENT_REQUIRED,
            DownloadError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            DownloadError::VerificationFailed(_) | DownloadError::StorageUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.to_response(false)
    }
}
