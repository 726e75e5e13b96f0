pub mod cache_notifier;
pub mod sqlite_store;
pub mod story_api;

pub use cache_notifier::{CacheSignal, ChannelCacheNotifier};
pub use sqlite_store::SqliteStore;
pub use story_api::HttpGateway;
