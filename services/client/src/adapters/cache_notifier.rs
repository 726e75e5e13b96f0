//! services/client/src/adapters/cache_notifier.rs
//!
//! Channel-backed implementation of the `CacheNotifier` port. Whatever layer
//! caches raw network responses holds the receiving end.

use async_trait::async_trait;
use storyhub_core::{CacheNotifier, PortError, PortResult};
use tokio::sync::mpsc;
use tracing::debug;

/// Response caches the background layer keeps for the two remote origins.
pub const API_RESPONSE_CACHES: [&str; 2] = ["story-api-cache", "nominatim-api-cache"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSignal {
    /// Drop the named response caches.
    ClearApiCaches { caches: Vec<String> },
}

#[derive(Clone)]
pub struct ChannelCacheNotifier {
    sender: mpsc::UnboundedSender<CacheSignal>,
}

impl ChannelCacheNotifier {
    /// Creates the notifier and the receiver the cache layer listens on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CacheSignal>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl CacheNotifier for ChannelCacheNotifier {
    async fn clear_network_caches(&self) -> PortResult<()> {
        let signal = CacheSignal::ClearApiCaches {
            caches: API_RESPONSE_CACHES.iter().map(|c| c.to_string()).collect(),
        };
        self.sender
            .send(signal)
            .map_err(|_| PortError::StorageUnavailable("cache layer is not listening".to_string()))?;
        debug!("Sent ClearApiCaches signal");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_receives_both_cache_names() {
        let (notifier, mut receiver) = ChannelCacheNotifier::channel();

        notifier.clear_network_caches().await.unwrap();

        assert_eq!(
            receiver.recv().await,
            Some(CacheSignal::ClearApiCaches {
                caches: vec![
                    "story-api-cache".to_string(),
                    "nominatim-api-cache".to_string()
                ]
            })
        );
    }

    #[tokio::test]
    async fn dropped_listener_is_an_error() {
        let (notifier, receiver) = ChannelCacheNotifier::channel();
        drop(receiver);

        assert!(notifier.clear_network_caches().await.is_err());
    }
}
