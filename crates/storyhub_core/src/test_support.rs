//! Shared fixtures for the core's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

use crate::domain::{
    GeoPoint, LocationDetails, LoginOutcome, NewStory, Story, StoryPage, StoryQuery,
    SubmitReceipt,
};
use crate::ports::{PortError, PortResult, RemoteGateway};

pub fn story(id: &str) -> Story {
    Story {
        id: id.to_string(),
        name: "Alice".to_string(),
        description: "hi".to_string(),
        photo_url: format!("https://example.test/{id}.jpg"),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        location: None,
    }
}

pub fn located_story(id: &str, lat: f64, lon: f64) -> Story {
    Story {
        location: Some(GeoPoint { lat, lon }),
        ..story(id)
    }
}

pub fn page(stories: Vec<Story>) -> StoryPage {
    let total = stories.len();
    StoryPage { stories, total }
}

pub fn network_down() -> PortError {
    PortError::Network("connection refused".to_string())
}

/// A `RemoteGateway` that replays queued responses in order.
#[derive(Default)]
pub struct ScriptedGateway {
    pub list_responses: Mutex<VecDeque<PortResult<StoryPage>>>,
    pub story_responses: Mutex<VecDeque<PortResult<Story>>>,
    pub submit_responses: Mutex<VecDeque<PortResult<SubmitReceipt>>>,
    pub login_responses: Mutex<VecDeque<PortResult<LoginOutcome>>>,
    pub register_responses: Mutex<VecDeque<PortResult<String>>>,
    pub address: Mutex<Option<LocationDetails>>,
    held_list: Mutex<Option<oneshot::Receiver<()>>>,
    pub list_calls: AtomicUsize,
    pub story_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub address_calls: AtomicUsize,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, response: PortResult<StoryPage>) -> &Self {
        self.list_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_story(&self, response: PortResult<Story>) -> &Self {
        self.story_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_submit(&self, response: PortResult<SubmitReceipt>) -> &Self {
        self.submit_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_login(&self, response: PortResult<LoginOutcome>) -> &Self {
        self.login_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_register(&self, response: PortResult<String>) -> &Self {
        self.register_responses.lock().unwrap().push_back(response);
        self
    }

    /// The next `list_stories` call waits until the returned sender fires.
    pub fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.held_list.lock().unwrap() = Some(rx);
        tx
    }

    fn pop<T>(queue: &Mutex<VecDeque<PortResult<T>>>) -> PortResult<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Network("no scripted response".to_string())))
    }
}

#[async_trait]
impl RemoteGateway for ScriptedGateway {
    async fn list_stories(&self, token: &str, _query: &StoryQuery) -> PortResult<StoryPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(token.to_string());
        let response = Self::pop(&self.list_responses);
        let held = self.held_list.lock().unwrap().take();
        if let Some(rx) = held {
            let _ = rx.await;
        }
        response
    }

    async fn get_story(&self, _id: &str, token: &str) -> PortResult<Story> {
        self.story_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(token.to_string());
        Self::pop(&self.story_responses)
    }

    async fn submit_story(&self, _story: &NewStory, _token: &str) -> PortResult<SubmitReceipt> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.submit_responses)
    }

    async fn login(&self, _email: &str, _password: &str) -> PortResult<LoginOutcome> {
        Self::pop(&self.login_responses)
    }

    async fn register(&self, _name: &str, _email: &str, _password: &str) -> PortResult<String> {
        Self::pop(&self.register_responses)
    }

    async fn resolve_address(&self, lat: f64, lon: f64) -> LocationDetails {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        self.address
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| LocationDetails::resolved("Jakarta, Indonesia", GeoPoint { lat, lon }))
    }
}
