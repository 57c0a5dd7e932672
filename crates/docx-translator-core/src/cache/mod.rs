mod memory;
mod disk;
mod key;

pub use memory::MemoryCache;
pub use disk::DiskCache;
pub use key::CacheKey;

use tracing::warn;

use crate::config::CacheConfig;
use crate::error::Result;

/// Translated-text cache with memory and disk layers.
///
/// Cloning is cheap and shares both layers, so one cache can serve every
/// request of a server process.
#[derive(Clone)]
pub struct TranslationCache {
    memory: Option<MemoryCache>,
    disk: Option<DiskCache>,
}

impl TranslationCache {
    /// Create a new translation cache from configuration
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let memory = config.memory_enabled.then(|| {
            MemoryCache::new(config.memory_max_mb, config.memory_ttl_seconds)
        });

        let disk = if config.disk_enabled {
            let path = config
                .disk_path
                .clone()
                .unwrap_or_else(crate::util::translation_cache_path);
            Some(DiskCache::open(path)?)
        } else {
            None
        };

        Ok(Self { memory, disk })
    }

    /// A cache that stores nothing
    pub const fn disabled() -> Self {
        Self {
            memory: None,
            disk: None,
        }
    }

    /// Get a cached translation, memory first.
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        if let Some(ref memory) = self.memory
            && let Some(text) = memory.get(key).await
        {
            return Some(text);
        }

        let text = self.disk.as_ref()?.get(key)?;

        // Populate memory cache on disk hit
        if let Some(ref memory) = self.memory {
            memory.insert(key.clone(), &text).await;
        }
        Some(text)
    }

    /// Store a translation in every enabled layer.
    pub async fn insert(&self, key: &CacheKey, text: &str) {
        if let Some(ref memory) = self.memory {
            memory.insert(key.clone(), text).await;
        }

        if let Some(ref disk) = self.disk
            && let Err(e) = disk.insert(key, text)
        {
            warn!("Failed to persist translation: {}", e);
        }
    }
}
