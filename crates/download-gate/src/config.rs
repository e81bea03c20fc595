use std::env;
use url::Url;

use crate::processor::DEFAULT_API_BASE;

const DEFAULT_PORT: u16 = 8787;
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;

/// Where product archives are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Directory on local disk
    Local(String),
    /// Public base URL of an HTTP bucket
    Http(String),
}

#[derive(Clone)]
pub struct GateConfig {
    /// Payment processor secret key
    pub stripe_secret_key: String,
    /// Payment processor API base URL
    pub stripe_api_base: String,
    /// Product archive storage
    pub storage: StorageConfig,
    /// Server port
    pub port: u16,
    /// CORS allowed origins (empty = any origin)
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute per IP
    pub rate_limit_rpm: u32,
    /// Bearer token required for /metrics (None = public)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("stripe_secret_key", &"[REDACTED]")
            .field("stripe_api_base", &self.stripe_api_base)
            .field("storage", &self.storage)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl GateConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let stripe_secret_key =
            var("STRIPE_SECRET_KEY").ok_or(ConfigError::MissingRequired("STRIPE_SECRET_KEY"))?;
        if !stripe_secret_key.starts_with("sk_") && !stripe_secret_key.starts_with("rk_") {
            tracing::warn!("STRIPE_SECRET_KEY does not look like a secret or restricted key");
        }

        let stripe_api_base =
            var("STRIPE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Url::parse(&stripe_api_base)
            .map_err(|_| ConfigError::InvalidUrl(stripe_api_base.clone()))?;

        // A local directory takes precedence over a remote bucket
        let storage = match (var("STORAGE_DIR"), var("STORAGE_BASE_URL")) {
            (Some(dir), _) => StorageConfig::Local(dir),
            (None, Some(base)) => {
                Url::parse(&base).map_err(|_| ConfigError::InvalidUrl(base.clone()))?;
                StorageConfig::Http(base)
            }
            (None, None) => {
                return Err(ConfigError::MissingRequired(
                    "STORAGE_DIR or STORAGE_BASE_URL",
                ))
            }
        };

        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidNumber("PORT", p))?,
            None => DEFAULT_PORT,
        };

        let allowed_origins: Vec<String> = var("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let rate_limit_rpm = match var("RATE_LIMIT_RPM") {
            Some(r) => match r.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidNumber("RATE_LIMIT_RPM", r)),
            },
            None => DEFAULT_RATE_LIMIT_RPM,
        };

        let metrics_token = var("METRICS_TOKEN");
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set; /metrics is publicly readable");
        }

        Ok(Self {
            stripe_secret_key,
            stripe_api_base,
            storage,
            port,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid value for {0}: {1}")]
    InvalidNumber(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GateConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("STRIPE_SECRET_KEY", "sk_test_abc"),
            ("STORAGE_DIR", "/srv/products"),
        ])
        .unwrap();
        assert_eq!(config.stripe_api_base, "https://api.stripe.com");
        assert_eq!(config.storage, StorageConfig::Local("/srv/products".into()));
        assert_eq!(config.port, 8787);
        assert_eq!(config.rate_limit_rpm, 60);
        assert!(config.allowed_origins.is_empty());
        assert!(config.metrics_token.is_none());
    }

    #[test]
    fn test_secret_key_required() {
        let err = load(&[("STORAGE_DIR", "/srv")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("STRIPE_SECRET_KEY")));

        let err = load(&[("STRIPE_SECRET_KEY", "  "), ("STORAGE_DIR", "/srv")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_storage_required() {
        let err = load(&[("STRIPE_SECRET_KEY", "sk_test_abc")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_storage_dir_wins_over_base_url() {
        let config = load(&[
            ("STRIPE_SECRET_KEY", "sk_test_abc"),
            ("STORAGE_DIR", "./data"),
            ("STORAGE_BASE_URL", "https://files.example.com"),
        ])
        .unwrap();
        assert_eq!(config.storage, StorageConfig::Local("./data".into()));
    }

    #[test]
    fn test_http_storage_and_overrides() {
        let config = load(&[
            ("STRIPE_SECRET_KEY", "rk_live_abc"),
            ("STORAGE_BASE_URL", "https://files.example.com/bucket"),
            ("PORT", "9000"),
            ("ALLOWED_ORIGINS", "https://shop.example.com, https://www.example.com,"),
            ("RATE_LIMIT_RPM", "120"),
            ("METRICS_TOKEN", "t0ken"),
        ])
        .unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::Http("https://files.example.com/bucket".into())
        );
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.allowed_origins,
            vec!["https://shop.example.com", "https://www.example.com"]
        );
        assert_eq!(config.rate_limit_rpm, 120);
        assert_eq!(config.metrics_token.as_deref(), Some("t0ken"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = [("STRIPE_SECRET_KEY", "sk_test_abc"), ("STORAGE_DIR", "./data")];

        let mut vars = base.to_vec();
        vars.push(("STRIPE_API_BASE", "not a url"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidUrl(_))));

        let mut vars = base.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidNumber("PORT", _))));

        let mut vars = base.to_vec();
        vars.push(("RATE_LIMIT_RPM", "0"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidNumber("RATE_LIMIT_RPM", _))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("STRIPE_SECRET_KEY", "sk_live_verysecret"),
            ("STORAGE_DIR", "./data"),
            ("METRICS_TOKEN", "metricssecret"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("verysecret"));
        assert!(!debug.contains("metricssecret"));
    }
}
