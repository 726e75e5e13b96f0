//! services/client/src/app/commands.rs
//!
//! Command handlers for the CLI. Each one drives a core service and returns
//! the text to show the user.

use std::fmt::Write as _;
use std::path::Path;

use bytes::Bytes;
use storyhub_core::{Fetched, GeoPoint, NewStory, Photo, Story, StoryPage, StoryQuery, StoryView};
use tracing::info;

use crate::app::state::AppState;
use crate::error::ClientError;

pub const OFFLINE_NOTICE: &str = "Showing offline data: the story server could not be reached.";

fn render_story_line(story: &Story) -> String {
    let mut line = format!(
        "[{}] {} ({}) - {}",
        story.id,
        story.name,
        story.created_at.format("%Y-%m-%d"),
        story.description
    );
    if let Some(point) = story.location {
        let _ = write!(line, " @ {}", point.display());
    }
    line
}

fn render_page(fetched: &Fetched<StoryPage>, query: &StoryQuery) -> String {
    let mut out = String::new();
    if fetched.from_cache {
        let _ = writeln!(out, "{OFFLINE_NOTICE}");
    }
    let page = &fetched.data;
    let _ = writeln!(
        out,
        "Page {} - {} of {} stories",
        query.page,
        page.stories.len(),
        page.total
    );
    for story in &page.stories {
        let _ = writeln!(out, "{}", render_story_line(story));
    }
    out
}

fn render_view(fetched: &Fetched<StoryView>) -> String {
    let mut out = String::new();
    if fetched.from_cache {
        let _ = writeln!(out, "{OFFLINE_NOTICE}");
    }
    let view = &fetched.data;
    let story = &view.detail.story;
    let _ = writeln!(out, "{}", render_story_line(story));
    let _ = writeln!(out, "Photo: {}", story.photo_url);
    let _ = writeln!(out, "Location: {}", view.location.address);
    if !view.location.coordinates.is_empty() {
        let _ = writeln!(out, "Coordinates: {}", view.location.coordinates);
    }
    out
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<String, ClientError> {
    let credentials = state.auth.login(email, password).await?;
    Ok(format!("Logged in as {}", credentials.name))
}

pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> Result<String, ClientError> {
    let credentials = state.auth.register(name, email, password).await?;
    Ok(format!("Account created, logged in as {}", credentials.name))
}

pub async fn logout(state: &AppState) -> Result<String, ClientError> {
    state.auth.logout().await?;
    Ok("Logged out".to_string())
}

pub fn whoami(state: &AppState) -> String {
    let session = state.session.get_state();
    if session.is_logged_in {
        format!("Logged in as {}", session.username)
    } else {
        "Not logged in".to_string()
    }
}

pub async fn list_stories(state: &AppState, query: StoryQuery) -> Result<String, ClientError> {
    let fetched = state.stories.load_stories(query).await?;
    Ok(render_page(&fetched, &query))
}

pub async fn show_story(state: &AppState, id: &str) -> Result<String, ClientError> {
    let fetched = state.stories.load_story_detail(id).await?;
    Ok(render_view(&fetched))
}

/// Loads a photo from disk, guessing its content type from the extension.
pub async fn load_photo(path: &Path) -> Result<Photo, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ClientError::Internal(format!("{} is not a file", path.display())))?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(Photo {
        file_name,
        content_type,
        bytes: Bytes::from(bytes),
    })
}

pub async fn post_story(
    state: &AppState,
    description: String,
    photo: Option<&Path>,
    location: Option<GeoPoint>,
) -> Result<String, ClientError> {
    let photo = match photo {
        Some(path) => Some(load_photo(path).await?),
        None => None,
    };
    let receipt = state
        .stories
        .post_story(&NewStory {
            description,
            location,
            photo,
        })
        .await?;
    Ok(format!("Story posted: {}", receipt.message))
}

/// Saves a story for offline reading, taking it from the cached feed when
/// present and from the server otherwise.
pub async fn save_story(state: &AppState, id: &str) -> Result<String, ClientError> {
    let cached = state
        .stories
        .saved_stories()
        .await
        .into_iter()
        .find(|s| s.id == id);
    let story = match cached {
        Some(story) => story,
        None => state.stories.load_story_detail(id).await?.data.detail.story,
    };
    state.stories.save_for_offline(&story).await?;
    Ok(format!("Saved {} for offline reading", story.id))
}

pub async fn list_saved(state: &AppState) -> String {
    let stories = state.stories.saved_stories().await;
    if stories.is_empty() {
        return "No stories saved for offline reading".to_string();
    }
    stories
        .iter()
        .map(render_story_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn remove_saved(state: &AppState, id: &str) -> Result<String, ClientError> {
    state.stories.remove_saved(id).await?;
    Ok(format!("Removed {id} from offline storage"))
}

pub async fn clear_offline(state: &AppState, confirmed: bool) -> Result<String, ClientError> {
    if !confirmed {
        return Ok("This deletes every offline story. Re-run with --yes to confirm.".to_string());
    }
    state.offline_cache.clear_offline_data().await?;
    info!("User cleared offline data");
    Ok("All offline data removed".to_string())
}
