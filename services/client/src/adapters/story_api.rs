//! services/client/src/adapters/story_api.rs
//!
//! This module contains the HTTP adapter, which is the concrete implementation
//! of the `RemoteGateway` port from the `core` crate. It talks to the story API
//! and the reverse geocoder using `reqwest`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::header::USER_AGENT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use storyhub_core::{
    GeoPoint, LocationDetails, LoginOutcome, NewStory, PortError, PortResult, RemoteGateway,
    Story, StoryPage, StoryQuery, SubmitReceipt,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ClientError;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `RemoteGateway` port over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    api_base_url: String,
    geocoder_base_url: String,
    geocoder_user_agent: String,
}

impl HttpGateway {
    /// Creates a new `HttpGateway`. Base URLs must not end with a slash.
    pub fn new(
        client: Client,
        api_base_url: impl Into<String>,
        geocoder_base_url: impl Into<String>,
        geocoder_user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            geocoder_base_url: geocoder_base_url.into(),
            geocoder_user_agent: geocoder_user_agent.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self::new(
            client,
            config.api_base_url.clone(),
            config.geocoder_base_url.clone(),
            config.geocoder_user_agent.clone(),
        ))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path)
    }

    fn story_url(&self, id: &str) -> PortResult<Url> {
        let mut url = Url::parse(&self.api_url("stories"))
            .map_err(|e| PortError::Network(format!("invalid API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| PortError::Network("API URL cannot take a path".to_string()))?
            .push(id);
        Ok(url)
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    photo_url: String,
    created_at: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl StoryRecord {
    fn to_domain(self) -> PortResult<Story> {
        let created_at = parse_timestamp(&self.created_at).ok_or_else(|| {
            PortError::Decode(format!("unrecognised createdAt '{}'", self.created_at))
        })?;
        Ok(Story {
            id: self.id,
            name: self.name,
            description: self.description,
            photo_url: self.photo_url,
            created_at,
            location: GeoPoint::from_parts(self.lat, self.lon),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryListResponse {
    list_story: Vec<StoryRecord>,
    #[serde(default)]
    total_stories: Option<usize>,
}

#[derive(Deserialize)]
struct StoryDetailResponse {
    story: StoryRecord,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResultRecord {
    #[serde(default)]
    user_id: String,
    name: String,
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    login_result: LoginResultRecord,
}

/// The `{error, message}` envelope every endpoint answers with.
#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ReverseGeocodeResponse {
    #[serde(default)]
    display_name: Option<String>,
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<MessageResponse>(body)
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

/// Sends the request once and decodes a JSON body.
async fn send_json<R: DeserializeOwned>(request: RequestBuilder) -> PortResult<R> {
    let response = request
        .send()
        .await
        .map_err(|e| PortError::Network(e.to_string()))?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| PortError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(PortError::Api {
            status: status.as_u16(),
            message: error_message(status, &body),
        });
    }
    serde_json::from_slice(&body).map_err(|e| PortError::Decode(e.to_string()))
}

fn photo_part(story: &NewStory) -> PortResult<Part> {
    let photo = story
        .photo
        .as_ref()
        .ok_or_else(|| PortError::InvalidEntity("story has no photo".to_string()))?;
    Part::bytes(photo.bytes.to_vec())
        .file_name(photo.file_name.clone())
        .mime_str(&photo.content_type)
        .map_err(|e| PortError::InvalidEntity(format!("bad photo content type: {e}")))
}

//=========================================================================================
// `RemoteGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn list_stories(&self, token: &str, query: &StoryQuery) -> PortResult<StoryPage> {
        debug!(page = query.page, size = query.size, "GET /stories");
        let request = self
            .client
            .get(self.api_url("stories"))
            .bearer_auth(token)
            .query(&[
                ("page", query.page.to_string()),
                ("size", query.size.to_string()),
                ("location", query.location.as_query_value().to_string()),
            ]);
        let response: StoryListResponse = send_json(request).await?;

        let stories: Vec<Story> = response
            .list_story
            .into_iter()
            .filter_map(|record| match record.to_domain() {
                Ok(story) => Some(story),
                Err(e) => {
                    warn!("Skipping story record: {}", e);
                    None
                }
            })
            .collect();
        let total = response
            .total_stories
            .filter(|total| *total > 0)
            .unwrap_or(stories.len());
        Ok(StoryPage { stories, total })
    }

    async fn get_story(&self, id: &str, token: &str) -> PortResult<Story> {
        debug!(story_id = id, "GET /stories/{{id}}");
        let request = self.client.get(self.story_url(id)?).bearer_auth(token);
        let response: StoryDetailResponse = send_json(request).await?;
        response.story.to_domain()
    }

    async fn submit_story(&self, story: &NewStory, token: &str) -> PortResult<SubmitReceipt> {
        let mut form = Form::new().text("description", story.description.clone());
        if let Some(point) = story.location {
            form = form
                .text("lat", point.lat.to_string())
                .text("lon", point.lon.to_string());
        }
        form = form.part("photo", photo_part(story)?);

        debug!("POST /stories");
        let request = self
            .client
            .post(self.api_url("stories"))
            .bearer_auth(token)
            .multipart(form);
        let response: MessageResponse = send_json(request).await?;
        Ok(SubmitReceipt {
            message: response
                .message
                .unwrap_or_else(|| "Story created".to_string()),
        })
    }

    async fn login(&self, email: &str, password: &str) -> PortResult<LoginOutcome> {
        let request = self
            .client
            .post(self.api_url("login"))
            .json(&LoginRequest { email, password });
        let response: LoginResponse = send_json(request).await?;
        let result = response.login_result;
        if result.token.trim().is_empty() {
            return Err(PortError::Decode("loginResult has an empty token".to_string()));
        }
        Ok(LoginOutcome {
            user_id: result.user_id,
            name: result.name,
            token: result.token,
        })
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<String> {
        let request = self
            .client
            .post(self.api_url("register"))
            .json(&RegisterRequest {
                name,
                email,
                password,
            });
        let response: MessageResponse = send_json(request).await?;
        Ok(response
            .message
            .unwrap_or_else(|| "User created".to_string()))
    }

    async fn resolve_address(&self, lat: f64, lon: f64) -> LocationDetails {
        let point = GeoPoint { lat, lon };
        let request = self
            .client
            .get(format!("{}/reverse", self.geocoder_base_url))
            .header(USER_AGENT, &self.geocoder_user_agent)
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ]);

        match send_json::<ReverseGeocodeResponse>(request).await {
            Ok(response) => LocationDetails::resolved(
                response
                    .display_name
                    .unwrap_or_else(|| "Unknown location".to_string()),
                point,
            ),
            Err(PortError::Api { status, .. }) => {
                warn!(status, "Reverse geocoding rejected");
                LocationDetails::unavailable(point)
            }
            Err(e) => {
                warn!("Reverse geocoding failed: {}", e);
                LocationDetails::failed(point)
            }
        }
    }
}
