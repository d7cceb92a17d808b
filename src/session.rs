//! Server-side sessions addressed by an opaque id.
//!
//! The id travels in the `x-session-id` header. Handlers take a snapshot of
//! the session, work on it, and write it back with [`Session::save`].

use chrono::{DateTime, Duration, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::basket::SessionBasket;

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone, Debug, Default)]
pub struct SessionData {
    pub user_id: Option<i32>,
    pub basket: SessionBasket,
}

#[derive(Clone, Debug)]
struct StoredSession {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Returns the live session for `id`, or a fresh one that is only
    /// stored once it is saved.
    pub fn open(&self, id: Option<&str>) -> Session {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|_, stored| stored.expires_at > now);

        if let Some(id) = id {
            if let Some(stored) = sessions.get_mut(id) {
                stored.expires_at = now + self.ttl;
                return Session {
                    id: id.to_owned(),
                    data: stored.data.clone(),
                    store: self.clone(),
                };
            }
        }

        Session {
            id: new_session_id(),
            data: SessionData::default(),
            store: self.clone(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions
            .read()
            .map(|s| s.contains_key(id))
            .unwrap_or_default()
    }

    fn discard(&self, id: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(id);
    }

    fn write(&self, id: &str, data: SessionData) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(
            id.to_owned(),
            StoredSession {
                data,
                expires_at: Utc::now() + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Request-scoped handle to one session.
#[derive(Clone, Debug)]
pub struct Session {
    id: String,
    data: SessionData,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SessionData {
        &mut self.data
    }

    pub fn basket(&self) -> &SessionBasket {
        &self.data.basket
    }

    pub fn basket_mut(&mut self) -> &mut SessionBasket {
        &mut self.data.basket
    }

    pub fn save(&self) {
        self.store.write(&self.id, self.data.clone());
    }

    /// Moves the data to a new id; the old id stops resolving.
    pub fn rotate(&mut self) {
        self.store.discard(&self.id);
        self.id = new_session_id();
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
