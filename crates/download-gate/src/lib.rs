//! download-gate — hands out purchased files only after the payment processor
//! confirms the checkout session was paid.
//!
//! A request carries `session_id` (and optionally `product`) in the query
//! string. The gate validates the session id, looks the session up with the
//! processor, checks it was paid, resolves the product slug against the
//! [`Catalog`](catalog::Catalog) and streams the file from the
//! [`ObjectStore`](storage::ObjectStore).
//!
//! # Modules
//!
//! - [`catalog`] — Static slug → filename table
//! - [`session`] — Session id parsing and the processor's session record
//! - [`processor`] — Payment processor client ([`StripeClient`](processor::StripeClient))
//! - [`storage`] — Object storage backends (local directory, HTTP bucket)
//! - [`routes`] — `/download`, `/health` and `/metrics`
//! - [`metrics`] — Prometheus counters

pub mod catalog;
pub mod config;
pub mod cors;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;

pub use catalog::Catalog;
pub use config::GateConfig;
pub use error::DownloadError;
pub use state::AppState;
