use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let registry = Registry::new();
    registry
        .register(Box::new(DOWNLOAD_REQUESTS.clone()))
        .unwrap();
    registry
        .register(Box::new(DOWNLOADS_SERVED.clone()))
        .unwrap();
    registry
});

/// Terminal outcome of every /download request
pub static DOWNLOAD_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "download_gate_requests_total",
            "Download requests by method and outcome",
        ),
        &["method", "outcome"],
    )
    .unwrap()
});

/// Archives handed to clients, by product slug
pub static DOWNLOADS_SERVED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "download_gate_downloads_total",
            "Archives streamed to clients per product",
        ),
        &["product"],
    )
    .unwrap()
});

pub fn record_outcome(method: &str, outcome: &str) {
    DOWNLOAD_REQUESTS
        .with_label_values(&[method, outcome])
        .inc();
}

/// Render all registered metrics in Prometheus text format.
pub fn metrics_output() -> Result<String, prometheus::Error> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}
