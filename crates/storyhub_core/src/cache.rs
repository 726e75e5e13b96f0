//! crates/storyhub_core/src/cache.rs
//!
//! Manual invalidation of everything cached for offline use.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::SyncResult;
use crate::ports::{CacheNotifier, LocalStore};

pub struct OfflineCacheManager {
    store: Arc<dyn LocalStore>,
    notifier: Option<Arc<dyn CacheNotifier>>,
}

impl OfflineCacheManager {
    pub fn new(store: Arc<dyn LocalStore>, notifier: Option<Arc<dyn CacheNotifier>>) -> Self {
        Self { store, notifier }
    }

    /// Empties the local store, then asks the background cache layer (if any)
    /// to drop its response caches. Only the local store step can fail this.
    pub async fn clear_offline_data(&self) -> SyncResult<()> {
        self.store.clear_all().await?;
        info!("Offline story data cleared");

        if let Some(notifier) = &self.notifier {
            match notifier.clear_network_caches().await {
                Ok(()) => info!("Network response caches asked to clear"),
                Err(e) => warn!("Could not notify the network cache layer: {}", e),
            }
        }
        Ok(())
    }
}
