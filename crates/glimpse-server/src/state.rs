use std::sync::Arc;

use glimpse_core::analytics::AnalyticsEngine;
use glimpse_core::config::Config;
use glimpse_core::store::EventStore;
use glimpse_duckdb::DuckDbBackend;

use crate::apps::AppService;
use crate::auth::{AccessGuard, TokenService};
use crate::ingest::agent::WootheeClassifier;
use crate::ingest::geo::GeoResolver;
use crate::ingest::IngestionPipeline;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Built once at startup. The only mutable resource is the DuckDB connection,
/// which serializes access behind its own mutex.
pub struct AppState {
    /// Concrete backend, kept for the health check.
    pub db: Arc<DuckDbBackend>,

    /// The same backend seen through the storage trait.
    pub store: Arc<dyn EventStore>,

    pub config: Arc<Config>,

    pub tokens: Arc<TokenService>,
    pub guard: AccessGuard,
    pub ingest: IngestionPipeline,
    pub analytics: AnalyticsEngine,
    pub apps: AppService,
}

impl AppState {
    pub fn new(
        db: DuckDbBackend,
        config: Config,
        geo: Arc<dyn GeoResolver>,
        token_secret: &str,
    ) -> Self {
        let db = Arc::new(db);
        let store: Arc<dyn EventStore> = db.clone();
        let tokens = Arc::new(TokenService::new(token_secret));
        Self {
            guard: AccessGuard::new(tokens.clone(), store.clone()),
            ingest: IngestionPipeline::new(
                store.clone(),
                geo,
                Arc::new(WootheeClassifier::new()),
            ),
            analytics: AnalyticsEngine::new(store.clone()),
            apps: AppService::new(store.clone()),
            db,
            store,
            config: Arc::new(config),
            tokens,
        }
    }
}
