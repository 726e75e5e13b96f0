//! crates/storyhub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the story client.
//! These structs are independent of any database or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A latitude/longitude pair. A story either has both or neither.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Builds a point only when both halves are present.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Self { lat, lon }),
            _ => None,
        }
    }

    /// Four-decimal display form, e.g. `-6.2000, 106.8166`.
    pub fn display(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Lightweight story record shown in list views.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub id: String,
    pub name: String,
    pub description: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
}

impl Story {
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// A single story enriched with its resolved address, kept in its own collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryDetail {
    pub story: Story,
    /// Only set when reverse geocoding actually succeeded.
    pub address: Option<String>,
}

impl StoryDetail {
    pub fn id(&self) -> &str {
        &self.story.id
    }
}

impl From<Story> for StoryDetail {
    fn from(story: Story) -> Self {
        Self {
            story,
            address: None,
        }
    }
}

/// Display form of a story's location, possibly a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDetails {
    pub address: String,
    pub coordinates: String,
    /// False when `address` is placeholder text.
    pub resolved: bool,
}

impl LocationDetails {
    pub fn resolved(address: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            address: address.into(),
            coordinates: point.display(),
            resolved: true,
        }
    }

    /// The geocoder answered but refused the lookup.
    pub fn unavailable(point: GeoPoint) -> Self {
        Self {
            address: "Location details unavailable offline".to_string(),
            coordinates: format!("{} (cached)", point.display()),
            resolved: false,
        }
    }

    /// The geocoder could not be reached.
    pub fn failed(point: GeoPoint) -> Self {
        Self {
            address: "Failed to load location details".to_string(),
            coordinates: point.display(),
            resolved: false,
        }
    }

    /// The client is known to be offline, so no lookup was attempted.
    pub fn offline(point: GeoPoint) -> Self {
        Self {
            address: format!(
                "Coordinates: {} (address details unavailable offline)",
                point.display()
            ),
            coordinates: format!("{} (cached)", point.display()),
            resolved: false,
        }
    }

    pub fn none() -> Self {
        Self {
            address: "No location data".to_string(),
            coordinates: String::new(),
            resolved: false,
        }
    }
}

/// Server-side location filter for the story list (`location=0|1`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocationFilter {
    #[default]
    Any,
    WithLocation,
}

impl LocationFilter {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            LocationFilter::Any => "0",
            LocationFilter::WithLocation => "1",
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 18;

/// One page request against the story feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryQuery {
    pub page: u32,
    pub size: u32,
    pub location: LocationFilter,
}

impl Default for StoryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            location: LocationFilter::Any,
        }
    }
}

/// A window of the feed plus the server's total count.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryPage {
    pub stories: Vec<Story>,
    pub total: usize,
}

/// A read result tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    /// True only when the network was skipped or failed and local data existed.
    pub from_cache: bool,
    /// A newer load of the same kind was started before this one resolved.
    pub superseded: bool,
}

impl<T> Fetched<T> {
    pub fn fresh(data: T) -> Self {
        Self {
            data,
            from_cache: false,
            superseded: false,
        }
    }

    pub fn cached(data: T) -> Self {
        Self {
            data,
            from_cache: true,
            superseded: false,
        }
    }

    pub fn superseded_if(mut self, superseded: bool) -> Self {
        self.superseded = superseded;
        self
    }
}

/// Story detail as presented to a detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryView {
    pub detail: StoryDetail,
    pub location: LocationDetails,
}

/// Image attached to a new story.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Photo {
    /// A camera capture blob, uploaded as `captured.jpg`.
    pub fn captured(bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: "captured.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStory {
    pub description: String,
    pub location: Option<GeoPoint>,
    pub photo: Option<Photo>,
}

/// Acknowledgement returned by the server for a submitted story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub message: String,
}

/// Token and display name persisted across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user_id: String,
    pub name: String,
    pub token: String,
}

impl Credentials {
    /// Only a non-empty token authenticates requests.
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

impl From<LoginOutcome> for Credentials {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            token: outcome.token,
            name: outcome.name,
        }
    }
}
