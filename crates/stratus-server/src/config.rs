//! Application configuration.
//!
//! Defaults first, then an optional `config/stratus` file, then the
//! `STRATUS__*` environment overlay with `__` separators
//! (e.g. `STRATUS__ENGINE__MAX_WORKERS=8`).

use serde::{Deserialize, Serialize};
use stratus_engine::EngineConfig;
use stratus_events::BusConfig;
use stratus_placement::{ClassifierConfig, PriceTable};
use stratus_providers::ProviderSettings;

/// Root configuration for the Stratus process.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: HttpConfig,
    pub providers: ProvidersConfig,
    pub classifier: ClassifierConfig,
    pub pricing: PriceTable,
    pub engine: EngineConfig,
    pub events: BusConfig,
    pub auth: AuthSettings,
    pub catalog: CatalogSettings,
    pub predictor: PredictorSettings,
    pub persistence: PersistenceConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub cors: CorsConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allow_any_origin: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: false,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Per-provider enablement and defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    pub aws: ProviderSettings,
    pub azure: ProviderSettings,
    pub gcp: ProviderSettings,
}

/// Token issuance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub token_ttl_seconds: u64,

    /// Path to a file holding the HS256 signing key. When unset, a fixed
    /// development key is used and loudly warned about.
    pub signing_key_ref: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_seconds: 3600,
            signing_key_ref: None,
        }
    }
}

/// Catalog refresh cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub refresh_interval_seconds: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 900,
        }
    }
}

/// Access predictor artifact location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PredictorSettings {
    /// Path to the model artifact; unset leaves the predictor disabled and
    /// the classifier on its rule surrogate.
    pub model_path: Option<String>,
}

/// Durable state locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for migration job documents.
    pub jobs_dir: String,

    /// Path of the principals table document.
    pub principals_path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            jobs_dir: "./data/jobs".to_string(),
            principals_path: "./data/principals.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional file, and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config/stratus").required(false))
            .add_source(config::Environment::with_prefix("STRATUS").separator("__"))
            .build()?;
        settings.try_deserialize()
    }

    /// Sanity checks that should fail startup rather than limp along.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server port must be non-zero".to_string());
        }
        if self.engine.max_workers == 0 {
            return Err("engine.max_workers must be at least 1".to_string());
        }
        if self.events.ring_capacity == 0 {
            return Err("events.ring_capacity must be at least 1".to_string());
        }
        if self.auth.signing_key_ref.is_none() {
            tracing::warn!("auth.signing_key_ref unset; using the development signing key");
        }
        Ok(())
    }
}
