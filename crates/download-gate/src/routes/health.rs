use actix_web::{web, HttpRequest, HttpResponse};
use subtle::ConstantTimeEq;

use crate::metrics::metrics_output;
use crate::processor::PaymentProcessor;
use crate::state::AppState;
use crate::storage::ObjectStore;

/// GET /health - Liveness plus catalog size
pub async fn health<P, S>(state: web::Data<AppState<P, S>>) -> HttpResponse
where
    P: PaymentProcessor + 'static,
    S: ObjectStore + 'static,
{
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "download-gate",
        "version": env!("CARGO_PKG_VERSION"),
        "products": state.catalog.len(),
    }))
}

/// GET /metrics - Prometheus metrics, bearer-token gated when METRICS_TOKEN is set
pub async fn metrics<P, S>(req: HttpRequest, state: web::Data<AppState<P, S>>) -> HttpResponse
where
    P: PaymentProcessor + 'static,
    S: ObjectStore + 'static,
{
    if let Some(ref expected) = state.metrics_token {
        let authorized = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())))
            .unwrap_or(false);

        if !authorized {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "unauthorized",
                "message": "Valid Bearer token required for /metrics"
            }));
        }
    }

    match metrics_output() {
        Ok(output) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(output),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            HttpResponse::InternalServerError().body("Failed to encode metrics")
        }
    }
}

pub fn configure<P, S>(cfg: &mut web::ServiceConfig)
where
    P: PaymentProcessor + 'static,
    S: ObjectStore + 'static,
{
    cfg.route("/health", web::get().to(health::<P, S>))
        .route("/metrics", web::get().to(metrics::<P, S>));
}
