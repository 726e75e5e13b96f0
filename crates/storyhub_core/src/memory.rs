//! crates/storyhub_core/src/memory.rs
//!
//! In-memory implementations of the storage ports. They follow the same
//! contracts as the SQLite adapter and back the core's tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{Credentials, Story, StoryDetail};
use crate::ports::{CredentialStore, LocalStore, PortError, PortResult};

#[derive(Default)]
struct Collections {
    /// Insertion ordered; upserts overwrite in place.
    summaries: Vec<Story>,
    details: HashMap<String, StoryDetail>,
}

/// A `LocalStore` kept in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<Collections>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write fail with `StorageIo` until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every read fail with `StorageIo` until switched back.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_write(&self) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::StorageIo("write rejected".to_string()));
        }
        Ok(())
    }

    fn check_read(&self) -> PortResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::StorageIo("read rejected".to_string()));
        }
        Ok(())
    }
}

fn upsert_ordered(summaries: &mut Vec<Story>, story: &Story) {
    match summaries.iter_mut().find(|s| s.id == story.id) {
        Some(existing) => *existing = story.clone(),
        None => summaries.push(story.clone()),
    }
}

#[async_trait]
impl LocalStore for InMemoryStore {
    async fn replace_all_summaries(&self, stories: &[Story]) -> PortResult<()> {
        self.check_write()?;
        let mut collections = self.lock();
        collections.summaries.clear();
        for story in stories.iter().filter(|s| s.has_id()) {
            upsert_ordered(&mut collections.summaries, story);
        }
        Ok(())
    }

    async fn upsert_summary(&self, story: &Story) -> PortResult<()> {
        if !story.has_id() {
            return Err(PortError::InvalidEntity("story has no id".to_string()));
        }
        self.check_write()?;
        upsert_ordered(&mut self.lock().summaries, story);
        Ok(())
    }

    async fn list_all_summaries(&self) -> Vec<Story> {
        if let Err(e) = self.check_read() {
            tracing::warn!("Reading cached stories failed, returning none: {}", e);
            return Vec::new();
        }
        self.lock().summaries.clone()
    }

    async fn upsert_detail(&self, detail: &StoryDetail) -> PortResult<()> {
        if !detail.story.has_id() {
            return Err(PortError::InvalidEntity("story detail has no id".to_string()));
        }
        self.check_write()?;
        self.lock()
            .details
            .insert(detail.id().to_string(), detail.clone());
        Ok(())
    }

    async fn get_detail(&self, id: &str) -> PortResult<Option<StoryDetail>> {
        self.check_read()?;
        Ok(self.lock().details.get(id).cloned())
    }

    async fn delete_entity(&self, id: &str) -> PortResult<()> {
        self.check_write()?;
        let mut collections = self.lock();
        collections.summaries.retain(|s| s.id != id);
        collections.details.remove(id);
        Ok(())
    }

    async fn clear_all(&self) -> PortResult<()> {
        self.check_write()?;
        let mut collections = self.lock();
        collections.summaries.clear();
        collections.details.clear();
        Ok(())
    }
}

/// A `CredentialStore` kept in process memory.
#[derive(Default)]
pub struct InMemoryCredentials {
    slot: Mutex<Option<Credentials>>,
}

impl InMemoryCredentials {
    pub fn new(initial: Option<Credentials>) -> Self {
        Self {
            slot: Mutex::new(initial),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Credentials>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentials {
    async fn load(&self) -> PortResult<Option<Credentials>> {
        Ok(self.lock().clone())
    }

    async fn save(&self, credentials: &Credentials) -> PortResult<()> {
        *self.lock() = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        *self.lock() = None;
        Ok(())
    }
}
