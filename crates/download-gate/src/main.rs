use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};

use download_gate::config::{GateConfig, StorageConfig};
use download_gate::processor::StripeClient;
use download_gate::state::GateState;
use download_gate::storage::StorageBackend;
use download_gate::{cors, logging, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    logging::init_tracing();

    let config = match GateConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();

    let state = match GateState::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialise backends");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting download-gate on port {}", port);
    tracing::info!("Payment processor: {}", config.stripe_api_base);
    match &config.storage {
        StorageConfig::Local(dir) => tracing::info!("Storage: local directory {}", dir),
        StorageConfig::Http(base) => tracing::info!("Storage: HTTP bucket {}", base),
    }
    tracing::info!(
        "Catalog: {} products ({})",
        state.catalog.len(),
        state.catalog.slugs().join(", ")
    );
    tracing::info!("Rate limit: {} req/min per IP", config.rate_limit_rpm);

    let state_data = web::Data::from(state);

    let governor_conf = match GovernorConfigBuilder::default()
        .requests_per_minute(config.rate_limit_rpm as u64)
        .finish()
    {
        Some(c) => c,
        None => {
            tracing::error!("invalid rate limiter configuration");
            std::process::exit(1);
        }
    };

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(logging::access_logger())
            .wrap(cors::build_cors(&allowed_origins))
            .wrap(Governor::new(&governor_conf))
            .configure(routes::health::configure::<StripeClient, StorageBackend>)
            .configure(routes::download::configure::<StripeClient, StorageBackend>)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
