//! Tracing setup and the HTTP access log.

use actix_web::middleware::Logger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Access log line: peer, method, path, status, size, time.
///
/// `%U` is the path only. The query string carries the session id and must
/// not reach the logs, so `%r` (full request line) is never used.
pub const ACCESS_LOG_FORMAT: &str = "%a \"%{METHOD}xi %U\" %s %b %T";

pub fn access_logger() -> Logger {
    Logger::new(ACCESS_LOG_FORMAT)
        .custom_request_replace("METHOD", |req| req.method().to_string())
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
