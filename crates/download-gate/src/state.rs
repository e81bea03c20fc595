use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::{GateConfig, StorageConfig};
use crate::processor::{ProcessorError, StripeClient};
use crate::storage::{HttpObjectStore, LocalObjectStore, StorageBackend, StorageError};

/// Shared, read-only application state.
pub struct AppState<P, S> {
    pub processor: P,
    pub store: S,
    pub catalog: Catalog,
    /// Bearer token for /metrics (None = public)
    pub metrics_token: Option<String>,
}

impl<P, S> AppState<P, S> {
    pub fn new(processor: P, store: S, catalog: Catalog) -> Self {
        Self {
            processor,
            store,
            catalog,
            metrics_token: None,
        }
    }

    pub fn with_metrics_token(mut self, token: Option<String>) -> Self {
        self.metrics_token = token;
        self
    }
}

/// State used by the binary.
pub type GateState = AppState<StripeClient, StorageBackend>;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GateState {
    /// Wire the production processor and storage backend from config.
    pub fn from_config(config: &GateConfig) -> Result<Arc<Self>, StateError> {
        let processor = StripeClient::new(&config.stripe_api_base, &config.stripe_secret_key)?;

        let store = match &config.storage {
            StorageConfig::Local(dir) => StorageBackend::Local(LocalObjectStore::new(dir)),
            StorageConfig::Http(base) => StorageBackend::Http(HttpObjectStore::new(base)?),
        };

        Ok(Arc::new(
            AppState::new(processor, store, Catalog::builtin())
                .with_metrics_token(config.metrics_token.clone()),
        ))
    }
}
