use formchat_core::session::ChatSession;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Identifies one visitor's conversation on one form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub form: String,
    pub visitor: String,
}

impl SessionKey {
    pub fn new(form: impl Into<String>, visitor: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            visitor: visitor.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.form, self.visitor)
    }
}

/// A live session. The mutex serializes turns for its key.
pub type SharedSession = Arc<Mutex<ChatSession>>;

struct CacheEntry {
    session: SharedSession,
    /// Milliseconds since the cache's origin
    last_access: AtomicU64,
}

/// In-memory cache of active chat sessions.
///
/// The map itself is behind a `RwLock`; each session has its own `Mutex`,
/// so turns on different keys never wait on each other.
pub struct SessionCache {
    sessions: Arc<RwLock<HashMap<SessionKey, Arc<CacheEntry>>>>,
    origin: Instant,
}

impl SessionCache {
    /// Creates a new empty SessionCache.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            origin: Instant::now(),
        }
    }

    /// Gets a cached session and marks it as used.
    pub async fn get(&self, key: &SessionKey) -> Option<SharedSession> {
        let sessions = self.sessions.read().await;
        sessions.get(key).map(|entry| {
            self.touch(entry, Instant::now());
            entry.session.clone()
        })
    }

    /// Inserts `session` unless another request created one first.
    ///
    /// Returns the session that ended up cached and whether it is the new one.
    pub async fn insert_if_absent(&self, key: SessionKey, session: ChatSession) -> (SharedSession, bool) {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&key) {
            self.touch(existing, Instant::now());
            return (existing.session.clone(), false);
        }

        let entry = Arc::new(CacheEntry {
            session: Arc::new(Mutex::new(session)),
            last_access: AtomicU64::new(self.millis_at(Instant::now())),
        });
        let shared = entry.session.clone();
        sessions.insert(key, entry);
        (shared, true)
    }

    /// Drops sessions idle for at least `ttl`, returning how many were removed.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        self.evict_idle_at(Instant::now(), ttl).await
    }

    /// Same as [`evict_idle`](Self::evict_idle) with an explicit clock reading.
    pub async fn evict_idle_at(&self, now: Instant, ttl: Duration) -> usize {
        let now_ms = self.millis_at(now);
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            let last = entry.last_access.load(Ordering::Relaxed);
            now_ms.saturating_sub(last) < ttl_ms
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn touch(&self, entry: &CacheEntry, now: Instant) {
        entry
            .last_access
            .fetch_max(self.millis_at(now), Ordering::Relaxed);
    }

    fn millis_at(&self, instant: Instant) -> u64 {
        let elapsed = instant.saturating_duration_since(self.origin);
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formchat_core::config::FormConfig;
    use formchat_core::form::FormSchema;
    use formchat_core::record::FieldValues;

    fn session() -> ChatSession {
        let form = FormSchema::from_config(&FormConfig {
            name: "visit".to_string(),
            fields: "Reason: {{.Reason}}".to_string(),
            ..Default::default()
        })
        .unwrap();
        ChatSession::start(&form, "sys".to_string(), FieldValues::new())
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first() {
        let cache = SessionCache::new();
        let key = SessionKey::new("visit", "v1");

        let (first, created) = cache.insert_if_absent(key.clone(), session()).await;
        assert!(created);
        first.lock().await.record_user("hello");

        let (second, created) = cache.insert_if_absent(key.clone(), session()).await;
        assert!(!created);
        assert_eq!(second.lock().await.messages.len(), 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_keys_are_per_visitor() {
        let cache = SessionCache::new();
        cache.insert_if_absent(SessionKey::new("visit", "a"), session()).await;
        cache.insert_if_absent(SessionKey::new("visit", "b"), session()).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&SessionKey::new("visit", "c")).await.is_none());
        assert!(cache.get(&SessionKey::new("visit", "a")).await.is_some());
    }

    #[tokio::test]
    async fn test_evict_idle_at() {
        let cache = SessionCache::new();
        cache.insert_if_absent(SessionKey::new("visit", "old"), session()).await;

        let ttl = Duration::from_secs(60);
        let later = Instant::now() + Duration::from_secs(30);
        assert_eq!(cache.evict_idle_at(later, ttl).await, 0);

        let much_later = Instant::now() + Duration::from_secs(120);
        assert_eq!(cache.evict_idle_at(much_later, ttl).await, 1);
        assert!(cache.is_empty().await);
    }
}
