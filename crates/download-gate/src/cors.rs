//! CORS for the download endpoint.

use actix_cors::Cors;
use actix_web::http::header;

/// Build the CORS middleware from allowed origins.
///
/// With no origins configured any site may link to a download; the endpoint
/// is authorised by the session id, not by origin.
pub fn build_cors(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        let allowed = allowed_origins.to_vec();
        Cors::default().allowed_origin_fn(move |origin, _req_head| {
            let origin_str = origin.to_str().unwrap_or("");
            allowed.iter().any(|a| a == origin_str)
        })
    };

    cors.allowed_methods(vec!["GET", "HEAD", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![header::CONTENT_DISPOSITION, header::CONTENT_LENGTH])
        .max_age(3600)
}
