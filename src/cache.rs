//! On-disk key/value store with per-entry expiry
//!
//! Holds the remembered display language. Values are postcard-encoded
//! next to their expiry timestamp; expired entries are removed lazily on
//! read.

use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::task;

use crate::{Result, TripMapError};

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Handle to the store; clones share the same keyspace
#[derive(Clone)]
pub struct PersistentCache {
    store: Keyspace,
}

impl Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache").finish_non_exhaustive()
    }
}

fn store_error(action: &str, e: impl std::fmt::Display) -> TripMapError {
    TripMapError::cache(format!("Failed to {action}: {e}"))
}

fn get_from_store(store: &Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
    let value = store.get(key).map_err(|e| store_error("read entry", e))?;
    Ok(value.map(|v| v.to_vec()))
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|now| now.as_secs())
        .map_err(|e| store_error("read the clock", e))
}

impl PersistentCache {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = fjall::Database::builder(path)
            .open()
            .map_err(|e| store_error(&format!("open cache at {}", path.display()), e))?;
        let items = db
            .keyspace("tripmap", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| store_error("open keyspace", e))?;
        Ok(Self { store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = unix_now()?
            .checked_add(ttl.as_secs())
            .ok_or_else(|| TripMapError::cache("TTL overflow"))?;
        let bytes = postcard::to_stdvec(&StoredEntry { value, expires_at })
            .map_err(|e| store_error("encode entry", e))?;

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(|e| store_error("join store task", e))?
            .map_err(|e| store_error("write entry", e))?;
        Ok(())
    }

    /// Returns the value if present and fresh; `None` for misses and
    /// expired entries
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let Some(bytes) = task::spawn_blocking(move || get_from_store(&store, &key_bytes))
            .await
            .map_err(|e| store_error("join store task", e))??
        else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = match postcard::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Dropping undecodable cache entry: {}", e);
                self.remove(key).await?;
                return Ok(None);
            }
        };

        if unix_now()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key))
            .await
            .map_err(|e| store_error("join store task", e))?
            .map_err(|e| store_error("remove entry", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache
            .put("lang", "ja".to_string(), Duration::from_secs(3600))
            .await
            .unwrap();
        let value: Option<String> = cache.get("lang").await.unwrap();
        assert_eq!(value.as_deref(), Some("ja"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache.put("stale", 7u32, Duration::ZERO).await.unwrap();
        assert_eq!(cache.get::<u32>("stale").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache.put("k", 1u8, Duration::from_secs(60)).await.unwrap();
        cache.remove("k").await.unwrap();
        assert_eq!(cache.get::<u8>("k").await.unwrap(), None);
        assert_eq!(cache.get::<u8>("never-written").await.unwrap(), None);
    }

    #[test]
    fn test_unopenable_store_is_a_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, b"x").unwrap();

        let err = PersistentCache::open(&blocker).unwrap_err();
        assert!(matches!(err, TripMapError::Cache { .. }));
        assert!(err.user_message().contains("clear your cache"));
    }
}
