//! Per-client session state and the host's in-memory store.
//!
//! A [`Session`] is a plain attribute map. The dispatcher works on the
//! request's own copy; the host loads it from the [`SessionStore`] before
//! dispatch and saves it afterwards. Two overlapping requests from the same
//! client therefore race, and the later save wins. No lock is held across a
//! request.
//!
//! Sessions unused for longer than the store's idle timeout are dropped:
//! lazily when their id is presented again, and in bulk by
//! [`SessionStore::evict_idle`].

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::DataMap;

/// Attributes of one client session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    attributes: DataMap,
}

impl Session {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// A detached copy of every attribute.
    pub fn snapshot(&self) -> DataMap {
        self.attributes.clone()
    }

    /// Drops every attribute, then installs `attributes`.
    pub fn replace_all(&mut self, attributes: DataMap) {
        self.attributes = attributes;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.attributes.len() }
    pub fn is_empty(&self) -> bool { self.attributes.is_empty() }
}

impl From<DataMap> for Session {
    fn from(attributes: DataMap) -> Self {
        Self { attributes }
    }
}

/// Default idle timeout of a [`SessionStore`].
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct Entry {
    session: Session,
    last_access: Instant,
}

/// Sessions keyed by the id carried in the session cookie.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Entry>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self { Self::default() }

    /// A store that drops sessions unused for `idle_timeout`.
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self { sessions: DashMap::new(), idle_timeout }
    }

    pub fn idle_timeout(&self) -> Duration { self.idle_timeout }

    /// Looks up the session for `id`, or opens a fresh one.
    ///
    /// Returns the session id to use from now on, a copy of the session, and
    /// whether the id is new (the host then sets the cookie). An expired
    /// session is removed and a fresh one opened in its place.
    pub fn load(&self, id: Option<&str>) -> (String, Session, bool) {
        if let Some(id) = id {
            let now = Instant::now();
            if let Some(mut entry) = self.sessions.get_mut(id) {
                if now.duration_since(entry.last_access) < self.idle_timeout {
                    entry.last_access = now;
                    return (id.to_owned(), entry.session.clone(), false);
                }
            }
            if self.sessions.remove_if(id, |_, e| now.duration_since(e.last_access) >= self.idle_timeout).is_some() {
                debug!(session = %id, "session expired");
            }
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        debug!(session = %id, "session opened");
        (id, Session::new(), true)
    }

    pub fn save(&self, id: String, session: Session) {
        self.sessions.insert(id, Entry { session, last_access: Instant::now() });
    }

    /// Drops every session idle for at least the timeout. Returns how many
    /// were dropped.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, e| now.duration_since(e.last_access) < self.idle_timeout);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.sessions.len(), "idle sessions evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize { self.sessions.len() }
    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }
}
