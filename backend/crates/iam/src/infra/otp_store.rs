//! OTP Store
//!
//! Volatile email -> code cache on `moka`. Entries expire a fixed time
//! after they are written, whether or not anyone reads them.

use moka::future::Cache;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::domain::value_object::Email;

/// Short-lived, single-use one-time codes keyed by email
#[derive(Clone)]
pub struct OtpStore {
    cache: Cache<String, String>,
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Unconditional write; restarts the TTL
    pub async fn save(&self, email: &Email, code: String) {
        self.cache.insert(email.as_str().to_string(), code).await;
    }

    /// Atomic insert-if-absent; `false` when a live code already exists
    pub async fn insert_if_absent(&self, email: &Email, code: String) -> bool {
        self.cache
            .entry(email.as_str().to_string())
            .or_insert(code)
            .await
            .is_fresh()
    }

    pub async fn get(&self, email: &Email) -> Option<String> {
        self.cache.get(email.as_str()).await
    }

    pub async fn delete(&self, email: &Email) {
        self.cache.invalidate(email.as_str()).await;
    }

    /// Remove and return the code; of two concurrent callers only one gets it
    pub async fn take(&self, email: &Email) -> Option<String> {
        self.cache.remove(email.as_str()).await
    }

    /// Periodically evict expired entries even when nobody touches the cache
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.cache.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                cache.run_pending_tasks().await;
                tracing::debug!(entries = cache.entry_count(), "OTP cache swept");
            }
        })
    }
}

impl std::fmt::Debug for OtpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::new("ana@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let store = OtpStore::new(Duration::from_secs(300));
        assert_eq!(store.get(&email()).await, None);

        store.save(&email(), "123456".into()).await;
        assert_eq!(store.get(&email()).await.as_deref(), Some("123456"));

        store.delete(&email()).await;
        assert_eq!(store.get(&email()).await, None);
    }

    #[tokio::test]
    async fn test_insert_if_absent() {
        let store = OtpStore::new(Duration::from_secs(300));
        assert!(store.insert_if_absent(&email(), "111111".into()).await);
        assert!(!store.insert_if_absent(&email(), "222222".into()).await);
        assert_eq!(store.get(&email()).await.as_deref(), Some("111111"));
    }

    #[tokio::test]
    async fn test_take_is_single_use() {
        let store = OtpStore::new(Duration::from_secs(300));
        store.save(&email(), "123456".into()).await;

        assert_eq!(store.take(&email()).await.as_deref(), Some("123456"));
        assert_eq!(store.take(&email()).await, None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = OtpStore::new(Duration::from_millis(50));
        store.save(&email(), "123456".into()).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.get(&email()).await, None);
        assert!(store.insert_if_absent(&email(), "654321".into()).await);
    }
}
