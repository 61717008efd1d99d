use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tropex_core::Session;
use uuid::Uuid;

struct Entry {
    session: Arc<Mutex<Session>>,
    last_access: Mutex<Instant>,
}

impl Entry {
    fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            last_access: Mutex::new(Instant::now()),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.saturating_duration_since(*self.last_access.lock()) > ttl)
    }
}

/// Live conversations keyed by id.
///
/// Each session sits behind its own mutex so answers and queries for one
/// conversation are serialized while different conversations proceed in
/// parallel. With a TTL set, a session nobody has touched for longer than the
/// TTL counts as ended: lookups miss it and the next `create` evicts it.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<AHashMap<Uuid, Entry>>,
    ttl: Option<Duration>,
}

impl SessionRegistry {
    /// Registry whose sessions live until removed
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that drops sessions idle for longer than `ttl`
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(AHashMap::new()),
            ttl: Some(ttl),
        }
    }

    #[inline]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn create(&self) -> Uuid {
        self.evict_expired();
        let id = Uuid::new_v4();
        self.sessions.write().insert(id, Entry::new());
        id
    }

    /// Look a session up and mark it as used
    pub fn get(&self, id: &Uuid) -> Option<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read();
        let entry = sessions.get(id)?;
        let now = Instant::now();
        if entry.is_expired(self.ttl, now) {
            return None;
        }
        *entry.last_access.lock() = now;
        Some(entry.session.clone())
    }

    /// Drop a finished conversation
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    /// Drop every session idle past the TTL; returns how many went
    pub fn evict_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(self.ttl, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, live = sessions.len(), "expired sessions evicted");
        }
        evicted
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
