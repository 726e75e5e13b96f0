//! crates/storyhub_core/src/orchestrator.rs
//!
//! The fallback fetch policy shared by the list and detail reads:
//!
//! 1. No token and known offline: serve the local store or fail with
//!    `NoOfflineData`.
//! 2. No token: `AuthRequired`, the network is never attempted.
//! 3. Otherwise call the gateway. Success is written through to the local
//!    store (failures there are only logged) and returned fresh. A remote
//!    failure falls back to the local store, and if that has nothing the
//!    failure is returned inside `NoOfflineData`.
//!
//! Each load also takes a ticket from a per-kind counter. A load that
//! resolves after a newer one of the same kind was issued is flagged
//! `superseded` and skips its write-through.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    Fetched, LocationDetails, NewStory, Story, StoryDetail, StoryPage, StoryQuery, StoryView,
    SubmitReceipt,
};
use crate::error::{SyncError, SyncResult};
use crate::ports::{Connectivity, CredentialStore, LocalStore, PortError, RemoteGateway};

/// Monotonic per-kind load counter.
#[derive(Debug, Default)]
struct Generation(AtomicU64);

impl Generation {
    fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_superseded(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) != ticket
    }
}

pub struct FallbackFetcher {
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<dyn LocalStore>,
    credentials: Arc<dyn CredentialStore>,
    connectivity: Arc<dyn Connectivity>,
    list_generation: Generation,
    detail_generation: Generation,
}

impl FallbackFetcher {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        store: Arc<dyn LocalStore>,
        credentials: Arc<dyn CredentialStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            gateway,
            store,
            credentials,
            connectivity,
            list_generation: Generation::default(),
            detail_generation: Generation::default(),
        }
    }

    /// The persisted token, if any. Unreadable credentials count as none.
    async fn token(&self) -> Option<String> {
        match self.credentials.load().await {
            Ok(credentials) => credentials.filter(|c| c.has_token()).map(|c| c.token),
            Err(e) => {
                warn!("Could not read stored credentials: {}", e);
                None
            }
        }
    }

    //=====================================================================================
    // Story list
    //=====================================================================================

    pub async fn load_stories(&self, query: StoryQuery) -> SyncResult<Fetched<StoryPage>> {
        let ticket = self.list_generation.issue();
        let token = self.token().await;

        let Some(token) = token else {
            if !self.connectivity.is_online() {
                info!("Offline without a token, serving cached stories");
                let result = self.cached_page().await.map(Fetched::cached).ok_or(
                    SyncError::NoOfflineData { cause: None },
                )?;
                return Ok(result.superseded_if(self.list_generation.is_superseded(ticket)));
            }
            return Err(SyncError::AuthRequired);
        };

        match self.gateway.list_stories(&token, &query).await {
            Ok(mut page) => {
                let superseded = self.list_generation.is_superseded(ticket);
                if page.total == 0 {
                    page.total = page.stories.len();
                }
                if superseded {
                    debug!(page = query.page, "Stale story page, skipping cache write");
                } else if !page.stories.is_empty() {
                    if let Err(e) = self.store.replace_all_summaries(&page.stories).await {
                        warn!("Failed to cache story page {}: {}", query.page, e);
                    }
                }
                Ok(Fetched::fresh(page).superseded_if(superseded))
            }
            Err(e) if e.triggers_fallback() => {
                warn!("Fetching stories failed, trying offline data: {}", e);
                let superseded = self.list_generation.is_superseded(ticket);
                match self.cached_page().await {
                    Some(page) => Ok(Fetched::cached(page).superseded_if(superseded)),
                    None => Err(SyncError::NoOfflineData { cause: Some(e) }),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn cached_page(&self) -> Option<StoryPage> {
        let stories = self.store.list_all_summaries().await;
        if stories.is_empty() {
            return None;
        }
        let total = stories.len();
        Some(StoryPage { stories, total })
    }

    //=====================================================================================
    // Story detail
    //=====================================================================================

    pub async fn load_story_detail(&self, id: &str) -> SyncResult<Fetched<StoryView>> {
        let ticket = self.detail_generation.issue();
        let token = self.token().await;

        let Some(token) = token else {
            if !self.connectivity.is_online() {
                info!(story_id = id, "Offline without a token, serving cached detail");
                let detail = self
                    .cached_detail(id)
                    .await
                    .ok_or(SyncError::NoOfflineData { cause: None })?;
                let view = self.cached_view(detail).await;
                return Ok(Fetched::cached(view)
                    .superseded_if(self.detail_generation.is_superseded(ticket)));
            }
            return Err(SyncError::AuthRequired);
        };

        match self.gateway.get_story(id, &token).await {
            Ok(story) => {
                let location = self.resolve_location(&story).await;
                let detail = StoryDetail {
                    address: location
                        .as_ref()
                        .filter(|l| l.resolved)
                        .map(|l| l.address.clone()),
                    story,
                };
                let superseded = self.detail_generation.is_superseded(ticket);
                if superseded {
                    debug!(story_id = id, "Stale story detail, skipping cache write");
                } else if let Err(e) = self.store.upsert_detail(&detail).await {
                    warn!("Failed to cache story detail {}: {}", id, e);
                }
                let view = StoryView {
                    detail,
                    location: location.unwrap_or_else(LocationDetails::none),
                };
                Ok(Fetched::fresh(view).superseded_if(superseded))
            }
            Err(e) if e.triggers_fallback() => {
                warn!("Fetching story {} failed, trying offline data: {}", id, e);
                match self.cached_detail(id).await {
                    Some(detail) => {
                        let view = self.cached_view(detail).await;
                        Ok(Fetched::cached(view)
                            .superseded_if(self.detail_generation.is_superseded(ticket)))
                    }
                    None => Err(SyncError::NoOfflineData { cause: Some(e) }),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A cached detail, treating storage failures as a miss.
    async fn cached_detail(&self, id: &str) -> Option<StoryDetail> {
        match self.store.get_detail(id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!("Reading cached detail {} failed: {}", id, e);
                None
            }
        }
    }

    async fn resolve_location(&self, story: &Story) -> Option<LocationDetails> {
        let point = story.location?;
        Some(self.gateway.resolve_address(point.lat, point.lon).await)
    }

    /// Location for a detail served from the cache.
    async fn cached_view(&self, detail: StoryDetail) -> StoryView {
        let location = match (detail.story.location, detail.address.as_ref()) {
            (None, _) => LocationDetails::none(),
            (Some(point), Some(address)) => LocationDetails {
                address: address.clone(),
                coordinates: format!("{} (cached)", point.display()),
                resolved: true,
            },
            (Some(point), None) if self.connectivity.is_online() => {
                self.gateway.resolve_address(point.lat, point.lon).await
            }
            (Some(point), None) => LocationDetails::offline(point),
        };
        StoryView { detail, location }
    }

    //=====================================================================================
    // Offline library
    //=====================================================================================

    /// Stores one story in both collections without touching the rest of the cache.
    /// A cached address survives as long as the story's coordinates are unchanged.
    pub async fn save_for_offline(&self, story: &Story) -> SyncResult<()> {
        if !story.has_id() {
            return Err(PortError::InvalidEntity("story has no id".to_string()).into());
        }
        let address = self
            .cached_detail(&story.id)
            .await
            .filter(|cached| cached.story.location == story.location)
            .and_then(|cached| cached.address);
        self.store.upsert_summary(story).await?;
        self.store
            .upsert_detail(&StoryDetail {
                story: story.clone(),
                address,
            })
            .await?;
        info!(story_id = %story.id, "Story saved for offline reading");
        Ok(())
    }

    pub async fn saved_stories(&self) -> Vec<Story> {
        self.store.list_all_summaries().await
    }

    pub async fn remove_saved(&self, id: &str) -> SyncResult<()> {
        self.store.delete_entity(id).await?;
        info!(story_id = id, "Story removed from offline storage");
        Ok(())
    }

    //=====================================================================================
    // Submission
    //=====================================================================================

    pub async fn post_story(&self, story: &NewStory) -> SyncResult<SubmitReceipt> {
        if story.description.trim().is_empty() {
            return Err(SyncError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }
        if story.photo.is_none() {
            return Err(SyncError::InvalidInput(
                "a photo is required, upload or capture one first".to_string(),
            ));
        }
        let token = self.token().await.ok_or(SyncError::AuthRequired)?;
        let receipt = self.gateway.submit_story(story, &token).await?;
        info!("Story submitted: {}", receipt.message);
        Ok(receipt)
    }
}
