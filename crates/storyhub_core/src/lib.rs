pub mod auth;
pub mod cache;
pub mod connectivity;
pub mod domain;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod ports;
pub mod session;

#[cfg(test)]
mod test_support;

pub use auth::AuthService;
pub use cache::OfflineCacheManager;
pub use connectivity::ConnectivityFlag;
pub use domain::{
    Credentials, Fetched, GeoPoint, LocationDetails, LocationFilter, LoginOutcome, NewStory,
    Photo, Story, StoryDetail, StoryPage, StoryQuery, StoryView, SubmitReceipt,
};
pub use error::{SyncError, SyncResult};
pub use orchestrator::FallbackFetcher;
pub use ports::{
    CacheNotifier, Connectivity, CredentialStore, LocalStore, PortError, PortResult,
    RemoteGateway,
};
pub use session::{SessionPatch, SessionSnapshot, SessionState, SubscriptionId};
