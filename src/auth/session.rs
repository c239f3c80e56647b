//! Pending OAuth identities keyed by browser session id
//!
//! An entry lives from the provider callback until the signup or login
//! completion call, and is dropped once its TTL passes.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::models::PendingOAuthIdentity;

/// Cookie naming the browser session that owns a pending identity.
pub const SESSION_COOKIE: &str = "session_id";

#[async_trait]
pub trait PendingSessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<PendingOAuthIdentity>;
    async fn set(&self, session_id: &str, identity: PendingOAuthIdentity);
    async fn clear(&self, session_id: &str);
    /// Remove and return the identity in one step; at most one caller gets it.
    async fn take(&self, session_id: &str) -> Option<PendingOAuthIdentity>;
}

#[derive(Debug, Clone)]
struct PendingEntry {
    identity: PendingOAuthIdentity,
    created_at: DateTime<Utc>,
}

/// Process-local session store.
#[derive(Clone)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<String, PendingEntry>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    fn is_expired(&self, entry: &PendingEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at > self.ttl
    }

    /// Drop every entry older than the TTL. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    pub fn start_cleanup_task(store: InMemorySessionStore) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                let removed = store.purge_expired().await;
                if removed > 0 {
                    debug!(removed, "Purged expired pending OAuth sessions");
                }
            }
        });
    }
}

#[async_trait]
impl PendingSessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<PendingOAuthIdentity> {
        let entries = self.entries.read().await;
        entries
            .get(session_id)
            .filter(|entry| !self.is_expired(entry, Utc::now()))
            .map(|entry| entry.identity.clone())
    }

    async fn set(&self, session_id: &str, identity: PendingOAuthIdentity) {
        self.entries.write().await.insert(
            session_id.to_string(),
            PendingEntry {
                identity,
                created_at: Utc::now(),
            },
        );
    }

    async fn clear(&self, session_id: &str) {
        self.entries.write().await.remove(session_id);
    }

    async fn take(&self, session_id: &str) -> Option<PendingOAuthIdentity> {
        let entry = self.entries.write().await.remove(session_id)?;
        if self.is_expired(&entry, Utc::now()) {
            return None;
        }
        Some(entry.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> PendingOAuthIdentity {
        PendingOAuthIdentity {
            name: "testuser".to_string(),
            email: "test@example.com".to_string(),
            dob: None,
        }
    }

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = InMemorySessionStore::new(600);
        assert!(store.get("sid").await.is_none());

        store.set("sid", identity()).await;
        assert_eq!(store.get("sid").await, Some(identity()));
        assert!(store.get("other").await.is_none());

        store.clear("sid").await;
        assert!(store.get("sid").await.is_none());
    }

    #[tokio::test]
    async fn test_take_hands_identity_to_one_caller() {
        let store = InMemorySessionStore::new(600);
        store.set("sid", identity()).await;

        let (a, b) = tokio::join!(store.take("sid"), store.take("sid"));
        assert_eq!(a.is_some() as u8 + b.is_some() as u8, 1);
        assert!(store.get("sid").await.is_none());

        let expired = InMemorySessionStore::new(-1);
        expired.set("sid", identity()).await;
        assert!(expired.take("sid").await.is_none());
        assert_eq!(expired.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible_and_purged() {
        let store = InMemorySessionStore::new(-1);
        store.set("sid", identity()).await;

        assert!(store.get("sid").await.is_none());
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.purge_expired().await, 0);
    }
}
