//! crates/storyhub_core/src/ports.rs
//!
//! Defines the service contracts (traits) the offline-sync core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the HTTP client, the local database and the host UI.

use async_trait::async_trait;

use crate::domain::{
    Credentials, LocationDetails, LoginOutcome, NewStory, Story, StoryDetail, StoryPage,
    StoryQuery, SubmitReceipt,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// Errors raised by port implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The entity cannot be stored (e.g. missing identifier).
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),
    /// The backing store could not be opened or reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    /// A storage transaction failed.
    #[error("Storage I/O error: {0}")]
    StorageIo(String),
    /// The server rejected the request.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),
    /// The response did not have the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl PortError {
    /// Remote failures that send a read operation to the local store.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            PortError::Api { .. } | PortError::Network(_) | PortError::Decode(_)
        )
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Key-addressed offline store with two collections: summaries and details.
///
/// Every call runs in its own transaction; nothing is atomic across calls.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Clears the summary collection, then inserts every story that has an id.
    /// Stories without an id are skipped.
    async fn replace_all_summaries(&self, stories: &[Story]) -> PortResult<()>;

    /// Inserts or overwrites one summary. Fails with `InvalidEntity` without an id.
    async fn upsert_summary(&self, story: &Story) -> PortResult<()>;

    /// All cached summaries. Backend failures degrade to an empty list.
    async fn list_all_summaries(&self) -> Vec<Story>;

    async fn upsert_detail(&self, detail: &StoryDetail) -> PortResult<()>;

    /// Returns `Ok(None)` when the detail is not cached.
    async fn get_detail(&self, id: &str) -> PortResult<Option<StoryDetail>>;

    /// Removes the id from both collections. Absent ids are not an error.
    async fn delete_entity(&self, id: &str) -> PortResult<()>;

    async fn clear_all(&self) -> PortResult<()>;
}

/// The story API and reverse geocoder. Exactly one attempt per call.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn list_stories(&self, token: &str, query: &StoryQuery) -> PortResult<StoryPage>;

    async fn get_story(&self, id: &str, token: &str) -> PortResult<Story>;

    async fn submit_story(&self, story: &NewStory, token: &str) -> PortResult<SubmitReceipt>;

    async fn login(&self, email: &str, password: &str) -> PortResult<LoginOutcome>;

    /// Returns the server's acknowledgement message.
    async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<String>;

    /// Best-effort lookup; degrades to placeholder text instead of failing.
    async fn resolve_address(&self, lat: f64, lon: f64) -> LocationDetails;
}

/// Durable storage for the authentication token and display name.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> PortResult<Option<Credentials>>;
    async fn save(&self, credentials: &Credentials) -> PortResult<()>;
    async fn clear(&self) -> PortResult<()>;
}

/// Whether the host currently believes it has network access.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// A cooperating background cache layer that holds network responses.
#[async_trait]
pub trait CacheNotifier: Send + Sync {
    /// Asks the layer to drop its response caches.
    async fn clear_network_caches(&self) -> PortResult<()>;
}
