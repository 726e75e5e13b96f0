//! services/client/src/adapters/sqlite_store.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `LocalStore` and `CredentialStore` ports from the `core` crate. It keeps
//! the offline copies in an embedded SQLite database using `sqlx`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use storyhub_core::{
    CredentialStore, Credentials, GeoPoint, LocalStore, PortError, PortResult, Story,
    StoryDetail,
};
use tracing::{info, warn};

use crate::error::ClientError;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a new `SqliteStore` over an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` and runs migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, ClientError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to an in-memory database gets its own empty copy.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self::new(pool);
        store.run_migrations().await?;
        info!("Offline database ready at {}", url);
        Ok(store)
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Unreachable or unopenable backends versus failed statements.
fn storage_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_) => PortError::StorageUnavailable(e.to_string()),
        _ => PortError::StorageIo(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StoryRow {
    id: String,
    name: String,
    description: String,
    photo_url: String,
    created_at: DateTime<Utc>,
    lat: Option<f64>,
    lon: Option<f64>,
}
impl StoryRow {
    fn to_domain(self) -> Story {
        Story {
            id: self.id,
            name: self.name,
            description: self.description,
            photo_url: self.photo_url,
            created_at: self.created_at,
            location: GeoPoint::from_parts(self.lat, self.lon),
        }
    }
}

#[derive(FromRow)]
struct StoryDetailRow {
    id: String,
    name: String,
    description: String,
    photo_url: String,
    created_at: DateTime<Utc>,
    lat: Option<f64>,
    lon: Option<f64>,
    address: Option<String>,
}
impl StoryDetailRow {
    fn to_domain(self) -> StoryDetail {
        StoryDetail {
            story: Story {
                id: self.id,
                name: self.name,
                description: self.description,
                photo_url: self.photo_url,
                created_at: self.created_at,
                location: GeoPoint::from_parts(self.lat, self.lon),
            },
            address: self.address,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    token: String,
    name: String,
}

const UPSERT_SUMMARY: &str = "INSERT INTO stories (id, name, description, photo_url, created_at, lat, lon) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
     ON CONFLICT(id) DO UPDATE SET name = excluded.name, description = excluded.description, \
     photo_url = excluded.photo_url, created_at = excluded.created_at, lat = excluded.lat, lon = excluded.lon";

const UPSERT_DETAIL: &str = "INSERT INTO story_details (id, name, description, photo_url, created_at, lat, lon, address) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
     ON CONFLICT(id) DO UPDATE SET name = excluded.name, description = excluded.description, \
     photo_url = excluded.photo_url, created_at = excluded.created_at, lat = excluded.lat, lon = excluded.lon, \
     address = excluded.address";

async fn write_summary<'e, E>(executor: E, story: &Story) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(UPSERT_SUMMARY)
        .bind(story.id.as_str())
        .bind(story.name.as_str())
        .bind(story.description.as_str())
        .bind(story.photo_url.as_str())
        .bind(story.created_at)
        .bind(story.location.map(|p| p.lat))
        .bind(story.location.map(|p| p.lon))
        .execute(executor)
        .await?;
    Ok(())
}

//=========================================================================================
// `LocalStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl LocalStore for SqliteStore {
    async fn replace_all_summaries(&self, stories: &[Story]) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        sqlx::query("DELETE FROM stories")
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        for story in stories.iter().filter(|s| s.has_id()) {
            write_summary(&mut *tx, story).await.map_err(storage_error)?;
        }
        tx.commit().await.map_err(storage_error)
    }

    async fn upsert_summary(&self, story: &Story) -> PortResult<()> {
        if !story.has_id() {
            return Err(PortError::InvalidEntity("story has no id".to_string()));
        }
        write_summary(&self.pool, story).await.map_err(storage_error)
    }

    async fn list_all_summaries(&self) -> Vec<Story> {
        let rows = sqlx::query_as::<_, StoryRow>(
            "SELECT id, name, description, photo_url, created_at, lat, lon FROM stories ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await;

        match rows {
            Ok(rows) => rows.into_iter().map(StoryRow::to_domain).collect(),
            Err(e) => {
                warn!("Reading cached stories failed, returning none: {}", e);
                Vec::new()
            }
        }
    }

    async fn upsert_detail(&self, detail: &StoryDetail) -> PortResult<()> {
        let story = &detail.story;
        if !story.has_id() {
            return Err(PortError::InvalidEntity("story detail has no id".to_string()));
        }
        sqlx::query(UPSERT_DETAIL)
            .bind(story.id.as_str())
            .bind(story.name.as_str())
            .bind(story.description.as_str())
            .bind(story.photo_url.as_str())
            .bind(story.created_at)
            .bind(story.location.map(|p| p.lat))
            .bind(story.location.map(|p| p.lon))
            .bind(detail.address.as_deref())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn get_detail(&self, id: &str) -> PortResult<Option<StoryDetail>> {
        let row = sqlx::query_as::<_, StoryDetailRow>(
            "SELECT id, name, description, photo_url, created_at, lat, lon, address \
             FROM story_details WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(row.map(StoryDetailRow::to_domain))
    }

    async fn delete_entity(&self, id: &str) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        sqlx::query("DELETE FROM stories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        sqlx::query("DELETE FROM story_details WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        tx.commit().await.map_err(storage_error)?;
        info!(story_id = id, "Deleted offline story");
        Ok(())
    }

    async fn clear_all(&self) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        for statement in ["DELETE FROM stories", "DELETE FROM story_details"] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }
        tx.commit().await.map_err(storage_error)?;
        info!("Cleared offline stories and details");
        Ok(())
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn load(&self) -> PortResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT token, name FROM credentials WHERE slot = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(row.map(|r| Credentials {
            token: r.token,
            name: r.name,
        }))
    }

    async fn save(&self, credentials: &Credentials) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO credentials (slot, token, name) VALUES (1, ?1, ?2) \
             ON CONFLICT(slot) DO UPDATE SET token = excluded.token, name = excluded.name",
        )
        .bind(credentials.token.as_str())
        .bind(credentials.name.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        sqlx::query("DELETE FROM credentials")
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
