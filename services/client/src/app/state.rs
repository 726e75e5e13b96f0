//! services/client/src/app/state.rs
//!
//! Defines the application's shared state: every core service wired to its
//! adapters, built once at startup and handed to the command handlers.

use std::sync::Arc;

use storyhub_core::{
    AuthService, CacheNotifier, Connectivity, ConnectivityFlag, CredentialStore,
    FallbackFetcher, LocalStore, OfflineCacheManager, RemoteGateway, SessionState,
};
use tracing::info;

use crate::adapters::{HttpGateway, SqliteStore};
use crate::config::Config;
use crate::error::ClientError;

//=========================================================================================
// AppState (Shared By All Commands)
//=========================================================================================

pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<SessionState>,
    pub connectivity: Arc<ConnectivityFlag>,
    pub auth: AuthService,
    pub stories: FallbackFetcher,
    pub offline_cache: OfflineCacheManager,
}

impl AppState {
    /// Connects the SQLite store and HTTP gateway described by `config`.
    pub async fn initialize(
        config: Arc<Config>,
        connectivity: Arc<ConnectivityFlag>,
        notifier: Option<Arc<dyn CacheNotifier>>,
    ) -> Result<Self, ClientError> {
        info!("Opening offline database...");
        let store = Arc::new(
            SqliteStore::connect(&config.database_url, config.database_max_connections).await?,
        );
        let gateway = Arc::new(HttpGateway::from_config(&config)?);
        Self::assemble(config, gateway, store.clone(), store, connectivity, notifier).await
    }

    /// Wires the core services over arbitrary port implementations.
    pub async fn assemble(
        config: Arc<Config>,
        gateway: Arc<dyn RemoteGateway>,
        store: Arc<dyn LocalStore>,
        credentials: Arc<dyn CredentialStore>,
        connectivity: Arc<ConnectivityFlag>,
        notifier: Option<Arc<dyn CacheNotifier>>,
    ) -> Result<Self, ClientError> {
        let session = Arc::new(SessionState::default());
        let auth = AuthService::new(gateway.clone(), credentials.clone(), session.clone());
        let stored = auth.restore().await?;
        info!(
            logged_in = stored.is_some(),
            online = connectivity.is_online(),
            "Session initialised"
        );

        let stories = FallbackFetcher::new(
            gateway,
            store.clone(),
            credentials,
            connectivity.clone(),
        );
        let offline_cache = OfflineCacheManager::new(store, notifier);

        Ok(Self {
            config,
            session,
            connectivity,
            auth,
            stories,
            offline_cache,
        })
    }
}
