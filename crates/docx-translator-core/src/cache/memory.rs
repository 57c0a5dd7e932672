use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::key::CacheKey;

/// Translations held in process memory, bounded by their size in bytes.
#[derive(Clone)]
pub struct MemoryCache {
    translations: Cache<CacheKey, Arc<str>>,
}

impl MemoryCache {
    pub fn new(max_mb: u64, ttl_seconds: u64) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(max_mb.saturating_mul(1024 * 1024))
            .weigher(|key: &CacheKey, text: &Arc<str>| -> u32 {
                u32::try_from(key.as_str().len() + text.len()).unwrap_or(u32::MAX)
            });

        if ttl_seconds > 0 {
            builder = builder.time_to_live(Duration::from_secs(ttl_seconds));
        }

        Self {
            translations: builder.build(),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        self.translations.get(key).await.map(|text| text.to_string())
    }

    pub async fn insert(&self, key: CacheKey, text: &str) {
        self.translations.insert(key, Arc::from(text)).await;
    }
}
