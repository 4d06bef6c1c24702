//! Read-through cache over the `enums` table.
//!
//! The cache is best-effort: any cache failure is logged and the table is
//! queried instead. Empty results are never cached, so a type with no rows
//! hits the table on every call.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::KvCache;
use crate::errors::AppError;
use crate::models::enums::EnumItem;
use crate::store::EnumStore;

pub const DEFAULT_TTL_SECS: u64 = 3600;

#[derive(Clone)]
pub struct EnumCache {
    store: Arc<dyn EnumStore>,
    cache: Arc<dyn KvCache>,
    ttl_secs: u64,
}

impl EnumCache {
    pub fn new(store: Arc<dyn EnumStore>, cache: Arc<dyn KvCache>, ttl_secs: u64) -> Self {
        Self {
            store,
            cache,
            ttl_secs,
        }
    }

    fn key(kind: &str) -> String {
        format!("enums:{kind}")
    }

    /// Items of `kind` ordered by value, from cache when warm.
    pub async fn get(&self, kind: &str) -> Result<Vec<EnumItem>, AppError> {
        let key = Self::key(kind);

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<EnumItem>>(&raw) {
                Ok(items) => {
                    debug!("Enum cache hit for {kind}");
                    return Ok(items);
                }
                Err(e) => warn!("Discarding undecodable enum cache entry {key}: {e}"),
            },
            Ok(None) => debug!("Enum cache miss for {kind}"),
            Err(e) => warn!("Enum cache read failed for {key}, falling back to table: {e}"),
        }

        let items = self.store.list_enum_items(kind).await?;

        if !items.is_empty() {
            match serde_json::to_string(&items) {
                Ok(raw) => {
                    if let Err(e) = self.cache.set_ex(&key, &raw, self.ttl_secs).await {
                        warn!("Enum cache populate failed for {key}: {e}");
                    }
                }
                Err(e) => warn!("Could not encode enum items for {key}: {e}"),
            }
        }

        Ok(items)
    }

    /// `get` applied to each type in order.
    pub async fn batch_get(&self, kinds: &[String]) -> Result<BTreeMap<String, Vec<EnumItem>>, AppError> {
        let mut result = BTreeMap::new();
        for kind in kinds {
            let items = self.get(kind).await?;
            result.insert(kind.clone(), items);
        }
        Ok(result)
    }

    /// Evicts the entry for `kind`. Failures are logged, never returned,
    /// so a write that already committed still succeeds.
    pub async fn invalidate(&self, kind: &str) {
        let key = Self::key(kind);
        if let Err(e) = self.cache.delete(&key).await {
            warn!("Enum cache eviction failed for {key}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryCache, MemoryStore};

    fn item(kind: &str, value: &str, label: &str) -> EnumItem {
        EnumItem {
            kind: kind.to_string(),
            value: value.to_string(),
            label: label.to_string(),
        }
    }

    fn setup() -> (Arc<MemoryStore>, Arc<MemoryCache>, EnumCache) {
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(MemoryCache::default());
        let enums = EnumCache::new(store.clone(), cache.clone(), DEFAULT_TTL_SECS);
        (store, cache, enums)
    }

    #[tokio::test]
    async fn test_second_get_is_served_from_cache() {
        let (store, cache, enums) = setup();
        store.seed_enum(item("channel", "referral", "Referral"));
        store.seed_enum(item("channel", "linkedin", "LinkedIn"));

        let first = enums.get("channel").await.unwrap();
        let second = enums.get("channel").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].value, "linkedin", "items are ordered by value");
        assert_eq!(store.enum_queries(), 1);
        assert!(cache.contains("enums:channel"));
    }

    #[tokio::test]
    async fn test_empty_type_is_never_cached() {
        let (store, cache, enums) = setup();

        assert!(enums.get("city").await.unwrap().is_empty());
        assert!(enums.get("city").await.unwrap().is_empty());

        assert_eq!(store.enum_queries(), 2);
        assert!(!cache.contains("enums:city"));
    }

    #[tokio::test]
    async fn test_invalidate_exposes_latest_rows() {
        let (store, _cache, enums) = setup();
        store.seed_enum(item("status", "applied", "Applied"));
        assert_eq!(enums.get("status").await.unwrap().len(), 1);

        store.seed_enum(item("status", "offer", "Offer"));
        assert_eq!(enums.get("status").await.unwrap().len(), 1, "stale until evicted");

        enums.invalidate("status").await;
        assert_eq!(enums.get("status").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_cache_degrades_to_table() {
        let (store, cache, enums) = setup();
        store.seed_enum(item("status", "applied", "Applied"));
        cache.set_failing(true);

        assert_eq!(enums.get("status").await.unwrap().len(), 1);
        assert_eq!(enums.get("status").await.unwrap().len(), 1);
        assert_eq!(store.enum_queries(), 2);

        // eviction errors are swallowed
        enums.invalidate("status").await;
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_reloaded() {
        let (store, cache, enums) = setup();
        store.seed_enum(item("status", "applied", "Applied"));
        cache.set_ex("enums:status", "not json", 60).await.unwrap();

        let items = enums.get("status").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(store.enum_queries(), 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        tokio::time::pause();
        let (store, _cache, enums) = setup();
        store.seed_enum(item("status", "applied", "Applied"));

        enums.get("status").await.unwrap();
        tokio::time::advance(std::time::Duration::from_secs(DEFAULT_TTL_SECS + 1)).await;
        enums.get("status").await.unwrap();

        assert_eq!(store.enum_queries(), 2);
    }

    #[tokio::test]
    async fn test_batch_get_covers_every_type() {
        let (store, _cache, enums) = setup();
        store.seed_enum(item("status", "applied", "Applied"));
        store.seed_enum(item("channel", "referral", "Referral"));

        let kinds = vec!["status".to_string(), "channel".to_string(), "city".to_string()];
        let result = enums.batch_get(&kinds).await.unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result["status"][0].label, "Applied");
        assert_eq!(result["channel"][0].value, "referral");
        assert!(result["city"].is_empty());
    }

    #[tokio::test]
    async fn test_table_failure_surfaces() {
        let (store, _cache, enums) = setup();
        store.set_failing(true);
        assert!(matches!(
            enums.get("status").await,
            Err(AppError::Internal(_))
        ));
    }
}
