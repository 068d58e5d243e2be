//! Shared application state.
//!
//! Every component is constructed once at startup and injected here; request
//! handlers get a cheap clone. There is no global mutable state.

use crate::config::AppConfig;
use crate::error::ApiResult;
use std::sync::Arc;
use stratus_auth::{AuthService, FilePrincipalStore, TokenSigner};
use stratus_catalog::{ObjectCatalog, RefreshSummary};
use stratus_engine::{FileJobStore, MigrationEngine};
use stratus_events::{Event, EventBus, EventKind};
use stratus_placement::{AccessPredictor, CostModel, PlacementClassifier};
use stratus_providers::{
    AwsAdapter, AzureAdapter, GcpAdapter, ProviderAdapter, ProviderRegistry,
};
use tracing::{info, warn};

/// Development-only signing key, used when `auth.signing_key_ref` is unset.
const DEV_SIGNING_KEY: &[u8] = b"stratus-development-signing-key-do-not-deploy";

/// Shared state cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub registry: Arc<ProviderRegistry>,
    pub catalog: Arc<ObjectCatalog>,
    pub classifier: Arc<PlacementClassifier>,
    pub predictor: Arc<AccessPredictor>,
    pub engine: MigrationEngine,
    pub bus: EventBus,
}

impl AppState {
    /// Assemble state from pre-built components. Tests inject mocks here.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        auth: Arc<AuthService>,
        registry: Arc<ProviderRegistry>,
        catalog: Arc<ObjectCatalog>,
        classifier: Arc<PlacementClassifier>,
        predictor: Arc<AccessPredictor>,
        engine: MigrationEngine,
        bus: EventBus,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth,
            registry,
            catalog,
            classifier,
            predictor,
            engine,
            bus,
        }
    }

    /// Build the full production object graph from configuration.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let bus = EventBus::new(config.events.clone());

        let mut registry = ProviderRegistry::new();
        if config.providers.aws.enabled {
            load_credentials_env(&config.providers.aws.credentials_ref);
            registry.register(
                ProviderAdapter::Aws(AwsAdapter::from_env()),
                config.providers.aws.default_container.clone(),
            );
        }
        if config.providers.azure.enabled {
            load_credentials_env(&config.providers.azure.credentials_ref);
            registry.register(
                ProviderAdapter::Azure(AzureAdapter::from_env()),
                config.providers.azure.default_container.clone(),
            );
        }
        if config.providers.gcp.enabled {
            load_credentials_env(&config.providers.gcp.credentials_ref);
            registry.register(
                ProviderAdapter::Gcp(GcpAdapter::from_env()),
                config.providers.gcp.default_container.clone(),
            );
        }
        let registry = Arc::new(registry);
        info!("configured providers: {:?}", registry.configured());

        let catalog = Arc::new(ObjectCatalog::new());

        let predictor = Arc::new(match &config.predictor.model_path {
            Some(path) => AccessPredictor::from_file(path),
            None => AccessPredictor::disabled(),
        });
        let classifier = Arc::new(PlacementClassifier::new(
            config.classifier.clone(),
            CostModel::new(config.pricing.clone()),
            predictor.clone(),
        ));

        let signing_key = match &config.auth.signing_key_ref {
            Some(path) => tokio::fs::read(path).await?,
            None => DEV_SIGNING_KEY.to_vec(),
        };
        let signer = TokenSigner::new(&signing_key, config.auth.token_ttl_seconds)
            .map_err(|e| anyhow::anyhow!("auth configuration: {}", e))?;
        let principals = FilePrincipalStore::open(&config.persistence.principals_path)
            .await
            .map_err(|e| anyhow::anyhow!("principal store: {}", e))?;
        let auth = Arc::new(AuthService::new(Arc::new(principals), signer));

        let job_store = FileJobStore::open(&config.persistence.jobs_dir)
            .await
            .map_err(|e| anyhow::anyhow!("job store: {}", e))?;
        let engine = MigrationEngine::new(
            config.engine.clone(),
            registry.clone(),
            catalog.clone(),
            bus.clone(),
            Arc::new(job_store),
        );

        Ok(Self::new(
            config, auth, registry, catalog, classifier, predictor, engine, bus,
        ))
    }
}

/// Load a provider's credential env file, when one is referenced. The path
/// itself may be logged; the contents never are.
fn load_credentials_env(credentials_ref: &Option<String>) {
    if let Some(path) = credentials_ref {
        match dotenv::from_path(path) {
            Ok(()) => info!("loaded provider credentials from {}", path),
            Err(err) => warn!("could not load credentials file {}: {}", path, err),
        }
    }
}

/// Refresh every configured provider's inventory, then re-run the classifier
/// over the catalog. Used by the admin endpoint and the periodic loop.
pub async fn refresh_catalog(state: &AppState) -> ApiResult<Vec<RefreshSummary>> {
    state.bus.publish(Event::new(
        EventKind::CatalogRefreshStarted,
        serde_json::json!({ "providers": state.registry.configured() }),
    ));

    let mut summaries = Vec::new();
    for provider in state.registry.configured() {
        let adapter = state.registry.get(provider)?;
        let container = match state.registry.container_for(provider, None) {
            Ok(container) => container,
            Err(_) => {
                warn!("provider {} has no default container; skipping refresh", provider);
                continue;
            }
        };
        let summary = state
            .catalog
            .refresh(provider, &adapter, &[container])
            .await?;
        summaries.push(summary);
    }

    state.bus.publish(Event::new(
        EventKind::CatalogRefreshCompleted,
        serde_json::to_value(&summaries).unwrap_or_default(),
    ));

    // Classifier pass over the refreshed inventory.
    let now = chrono::Utc::now();
    let entries = state.catalog.list(&Default::default());
    let mut updates = Vec::with_capacity(entries.len());
    let mut recommended = 0usize;
    for entry in &entries {
        let recommendation = state.classifier.classify(entry, now);
        if recommendation.is_some() {
            recommended += 1;
        }
        updates.push((entry.object.object_key(), recommendation));
    }
    state.catalog.set_recommendations(updates);

    state.bus.publish(Event::new(
        EventKind::PlacementRecommendationsUpdated,
        serde_json::json!({
            "objects": entries.len(),
            "recommendations": recommended,
        }),
    ));
    info!(
        "catalog refresh complete: {} objects, {} recommendations",
        entries.len(),
        recommended
    );

    Ok(summaries)
}
