//! `GET|HEAD /download?session_id=…&product=…`
//!
//! GET streams the purchased archive. HEAD runs the same checks without
//! touching storage and answers with headers only.

use actix_web::http::{header, Method};
use actix_web::{web, HttpRequest, HttpResponse};

use crate::catalog::storage_key;
use crate::error::DownloadError;
use crate::metrics::{record_outcome, DOWNLOADS_SERVED};
use crate::processor::{PaymentProcessor, SessionLookup};
use crate::session::{effective_slug, SessionId};
use crate::state::AppState;
use crate::storage::{ObjectStore, StoredObject};

pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadQuery {
    pub session_id: Option<String>,
    pub product: Option<String>,
}

impl DownloadQuery {
    /// Parse a raw query string. The first occurrence of each key wins;
    /// repeated or unknown keys are ignored.
    pub fn parse(query: &str) -> Self {
        let mut parsed = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "session_id" => &mut parsed.session_id,
                "product" => &mut parsed.product,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        parsed
    }
}

/// Result of a request that passed every check.
enum Grant {
    /// HEAD: the download would be served
    Verified { product: String },
    /// GET: archive ready to stream
    Archive {
        product: String,
        filename: &'static str,
        object: StoredObject,
    },
}

async fn authorize<P, S>(
    state: &AppState<P, S>,
    session_id: &SessionId,
    query: &DownloadQuery,
    metadata_only: bool,
) -> Result<Grant, DownloadError>
where
    P: PaymentProcessor,
    S: ObjectStore,
{
    let session = match state.processor.retrieve_session(session_id).await {
        Ok(SessionLookup::Found(session)) => session,
        Ok(SessionLookup::NotFound { status }) => {
            return Err(DownloadError::SessionNotFound(status))
        }
        Err(e) => return Err(DownloadError::VerificationFailed(e.to_string())),
    };

    if !session.is_paid() {
        return Err(DownloadError::PaymentIncomplete(session.payment_status));
    }

    let requested = query.product.as_deref().filter(|p| !p.is_empty());
    let slug = effective_slug(&session, requested);
    if let (Some(bought), Some(asked)) = (session.product_slug(), requested) {
        if bought != asked {
            tracing::warn!(
                session_mode = session_id.mode(),
                purchased = %bought,
                requested = %asked,
                "requested product differs from purchase; serving purchased product"
            );
        }
    }

    let filename = state
        .catalog
        .resolve(slug)
        .ok_or_else(|| DownloadError::UnknownProduct {
            slug: slug.to_string(),
            available: state.catalog.slugs(),
        })?;

    if metadata_only {
        return Ok(Grant::Verified {
            product: slug.to_string(),
        });
    }

    let key = storage_key(filename);
    let object = state
        .store
        .get(&key)
        .await
        .map_err(|e| DownloadError::StorageUnavailable(e.to_string()))?;
    let object = object.ok_or(DownloadError::ProductNotFound(key))?;

    Ok(Grant::Archive {
        product: slug.to_string(),
        filename,
        object,
    })
}

/// `session_mode` is "none" when the session id did not parse.
fn log_rejection(err: &DownloadError, method: &Method, session_mode: &str) {
    let outcome = err.outcome();
    match err {
        DownloadError::VerificationFailed(_) | DownloadError::StorageUnavailable(_) => {
            tracing::error!(method = %method, session_mode, outcome, error = %err, "download failed");
        }
        DownloadError::ProductNotFound(_) => {
            tracing::error!(
                method = %method,
                session_mode,
                outcome,
                error = %err,
                "paid download missing from storage"
            );
        }
        _ => tracing::info!(method = %method, session_mode, outcome, error = %err, "download rejected"),
    }
}

/// Handles both GET (full retrieval) and HEAD (metadata-only check).
pub async fn download<P, S>(req: HttpRequest, state: web::Data<AppState<P, S>>) -> HttpResponse
where
    P: PaymentProcessor + 'static,
    S: ObjectStore + 'static,
{
    let method = req.method().clone();
    let metadata_only = method == Method::HEAD;

    let query = DownloadQuery::parse(req.query_string());

    let result = match SessionId::parse(query.session_id.as_deref().unwrap_or_default()) {
        Ok(session_id) => {
            let session_mode = session_id.mode();
            authorize(state.get_ref(), &session_id, &query, metadata_only)
                .await
                .map(|grant| (grant, session_mode))
                .map_err(|err| (err, session_mode))
        }
        Err(err) => Err((err, "none")),
    };

    match result {
        Ok((Grant::Verified { product }, session_mode)) => {
            record_outcome(method.as_str(), "verified");
            tracing::info!(session_mode, product = %product, "download check passed");
            HttpResponse::Ok()
                .content_type(ARCHIVE_CONTENT_TYPE)
                .finish()
        }
        Ok((
            Grant::Archive {
                product,
                filename,
                object,
            },
            session_mode,
        )) => {
            record_outcome(method.as_str(), "served");
            DOWNLOADS_SERVED.with_label_values(&[product.as_str()]).inc();
            tracing::info!(
                session_mode,
                product = %product,
                filename = %filename,
                size = ?object.size,
                "serving download"
            );

            let mut builder = HttpResponse::Ok();
            builder
                .content_type(ARCHIVE_CONTENT_TYPE)
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ))
                .insert_header((header::CACHE_CONTROL, "no-store"));
            if let Some(size) = object.size {
                builder.no_chunking(size);
            }
            builder.streaming(object.body)
        }
        Err((err, session_mode)) => {
            record_outcome(method.as_str(), err.outcome());
            log_rejection(&err, &method, session_mode);
            err.to_response(metadata_only)
        }
    }
}

pub fn configure<P, S>(cfg: &mut web::ServiceConfig)
where
    P: PaymentProcessor + 'static,
    S: ObjectStore + 'static,
{
    cfg.service(
        web::resource("/download")
            .route(web::get().to(download::<P, S>))
            .route(web::head().to(download::<P, S>)),
    );
}
