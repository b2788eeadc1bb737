//! Session registry for the HTTP transport: one handshake state per client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use super::SessionState;

/// Header carrying the session identifier on Streamable HTTP.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Identified sessions kept before the least useful one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

struct Entry {
    state: Arc<SessionState>,
    last_seen: Instant,
}

/// Registry of per-client sessions keyed by server-minted ids.
///
/// Clients that never send a session id share the default session. The map
/// holds at most `max_sessions` entries; when full, sessions that never
/// completed the handshake go first, oldest activity first.
pub struct SessionStore {
    default: Arc<SessionState>,
    sessions: Mutex<HashMap<String, Entry>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            default: Arc::new(SessionState::new()),
            sessions: Mutex::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// The session shared by clients without a session id.
    pub fn default_session(&self) -> Arc<SessionState> {
        Arc::clone(&self.default)
    }

    /// Mint a new session id and register a fresh session under it.
    pub async fn create(&self) -> (String, Arc<SessionState>) {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(SessionState::new());

        let mut sessions = self.sessions.lock().await;
        while sessions.len() >= self.max_sessions {
            evict_one(&mut sessions);
        }
        sessions.insert(
            id.clone(),
            Entry {
                state: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );

        tracing::info!("Created session {id}");
        (id, session)
    }

    /// Look up a minted session and mark it active. Unknown ids are never
    /// opened implicitly.
    pub async fn get(&self, id: &str) -> Option<Arc<SessionState>> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.state))
    }

    /// Number of identified sessions (the default session is not counted).
    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn evict_one(sessions: &mut HashMap<String, Entry>) {
    let victim = sessions
        .iter()
        .min_by_key(|(_, e)| (e.state.is_initialized(), e.last_seen))
        .map(|(id, _)| id.clone());

    if let Some(id) = victim {
        sessions.remove(&id);
        tracing::debug!("Evicted session {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_same_session() {
        let store = SessionStore::new();
        let (id, session) = store.create().await;
        session.mark_initialized();

        let again = store.get(&id).await.unwrap();
        assert!(again.is_initialized());
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_opened() {
        let store = SessionStore::new();
        for i in 0..100 {
            assert!(store.get(&format!("junk-{i}")).await.is_none());
        }
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let (_, one) = store.create().await;
        one.mark_initialized();

        let (_, two) = store.create().await;
        assert!(!two.is_initialized());
        assert!(!store.default_session().is_initialized());
    }

    #[tokio::test]
    async fn test_create_mints_unique_ids() {
        let store = SessionStore::new();
        let (a, _) = store.create().await;
        let (b, _) = store.create().await;
        assert_ne!(a, b);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_count_stays_bounded() {
        let store = SessionStore::with_capacity(4);
        for _ in 0..50 {
            store.create().await;
        }
        assert_eq!(store.count().await, 4);
    }

    #[tokio::test]
    async fn test_eviction_prefers_unfinished_handshakes() {
        let store = SessionStore::with_capacity(2);
        let (kept, session) = store.create().await;
        session.mark_initialized();

        for _ in 0..10 {
            store.create().await;
        }

        assert!(store.get(&kept).await.is_some());
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_still_holds_one() {
        let store = SessionStore::with_capacity(0);
        let (id, _) = store.create().await;
        assert_eq!(store.max_sessions(), 1);
        assert!(store.get(&id).await.is_some());
    }
}
