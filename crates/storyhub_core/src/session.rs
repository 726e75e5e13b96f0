//! crates/storyhub_core/src/session.rs
//!
//! Process-wide authentication state with synchronous observers.
//!
//! One `SessionState` is built at startup and shared by reference (`Arc`)
//! with everything that needs it.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::Credentials;

/// The observable session record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_logged_in: bool,
    /// Empty when logged out.
    pub username: String,
}

impl SessionSnapshot {
    pub fn logged_in(username: impl Into<String>) -> Self {
        Self {
            is_logged_in: true,
            username: username.into(),
        }
    }

    pub fn logged_out() -> Self {
        Self::default()
    }
}

/// A shallow update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub is_logged_in: Option<bool>,
    pub username: Option<String>,
}

impl From<SessionSnapshot> for SessionPatch {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            is_logged_in: Some(snapshot.is_logged_in),
            username: Some(snapshot.username),
        }
    }
}

/// Handle returned by [`SessionState::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

struct Inner {
    state: SessionSnapshot,
    observers: Vec<(SubscriptionId, Observer)>,
    next_id: u64,
}

pub struct SessionState {
    inner: Mutex<Inner>,
}

impl SessionState {
    pub fn new(initial: SessionSnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: initial,
                observers: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Initial state from whatever credentials were persisted.
    pub fn from_credentials(credentials: Option<&Credentials>) -> Self {
        match credentials.filter(|c| c.has_token()) {
            Some(c) => Self::new(SessionSnapshot::logged_in(c.name.clone())),
            None => Self::new(SessionSnapshot::logged_out()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Observers never run under the lock, so a poisoned guard still holds consistent data.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_state(&self) -> SessionSnapshot {
        self.lock().state.clone()
    }

    /// Merges `patch` into the current state, then notifies every observer.
    pub fn set_state(&self, patch: impl Into<SessionPatch>) {
        let patch = patch.into();
        let (state, observers) = {
            let mut inner = self.lock();
            if let Some(is_logged_in) = patch.is_logged_in {
                inner.state.is_logged_in = is_logged_in;
            }
            if let Some(username) = patch.username {
                inner.state.username = username;
            }
            let observers: Vec<Observer> =
                inner.observers.iter().map(|(_, o)| o.clone()).collect();
            (inner.state.clone(), observers)
        };
        for observer in observers {
            observer(&state);
        }
    }

    /// Registers `observer` and calls it once right away with the current state.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(observer);
        let (id, state) = {
            let mut inner = self.lock();
            let id = SubscriptionId(inner.next_id);
            inner.next_id += 1;
            inner.observers.push((id, observer.clone()));
            (id, inner.state.clone())
        };
        observer(&state);
        id
    }

    /// Returns false when the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.observers.len();
        inner.observers.retain(|(existing, _)| *existing != id);
        inner.observers.len() != before
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionSnapshot::logged_out())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn subscribe_delivers_current_state_then_every_update() {
        let session = SessionState::new(SessionSnapshot::logged_in("Alice"));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        session.subscribe(move |s| sink.lock().unwrap().push(s.clone()));
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(seen.lock().unwrap()[0].username, "Alice");

        session.set_state(SessionSnapshot::logged_out());
        session.set_state(SessionPatch {
            username: Some("Bob".to_string()),
            ..Default::default()
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(!seen[1].is_logged_in);
        assert_eq!(seen[2].username, "Bob");
        assert!(!seen[2].is_logged_in);
    }

    #[test]
    fn unsubscribed_observer_stops_receiving() {
        let session = SessionState::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let id = session.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session.set_state(SessionSnapshot::logged_in("Carol"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observer_may_read_state_without_deadlock() {
        let session = Arc::new(SessionState::default());
        let reader = session.clone();
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = seen.clone();
        session.subscribe(move |_| *sink.lock().unwrap() = reader.get_state().username);

        session.set_state(SessionSnapshot::logged_in("Dana"));
        assert_eq!(*seen.lock().unwrap(), "Dana");
    }

    #[test]
    fn initial_state_follows_persisted_credentials() {
        let creds = Credentials {
            token: "t".to_string(),
            name: "Eve".to_string(),
        };
        assert_eq!(
            SessionState::from_credentials(Some(&creds)).get_state(),
            SessionSnapshot::logged_in("Eve")
        );
        assert!(!SessionState::from_credentials(None).get_state().is_logged_in);

        let blank = Credentials {
            token: String::new(),
            name: "Eve".to_string(),
        };
        assert!(!SessionState::from_credentials(Some(&blank)).get_state().is_logged_in);
    }
}
