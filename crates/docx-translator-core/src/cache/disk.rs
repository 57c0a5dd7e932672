use std::path::Path;
use tracing::{debug, warn};

use super::key::CacheKey;
use crate::error::{Error, Result};

/// sled tree holding translated texts, keyed by [`CacheKey`].
const TRANSLATIONS_TREE: &str = "translations";

/// Translations persisted with sled. Cloning shares the same database handle.
#[derive(Clone)]
pub struct DiskCache {
    translations: sled::Tree,
}

impl DiskCache {
    /// Open (or create) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::CacheInit(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let db = sled::open(path).map_err(|e| {
            let reason = e.to_string();
            // A second process (or a crashed one) still holds the lock file
            if reason.contains("WouldBlock") || reason.contains("lock") {
                Error::CacheInit(format!(
                    "{} is locked by another process. Stop it, run with caching \
                     disabled, or remove {}/db/LOCK if no other process is running",
                    path.display(),
                    path.display()
                ))
            } else {
                Error::CacheInit(format!("cannot open {}: {reason}", path.display()))
            }
        })?;

        let translations = db
            .open_tree(TRANSLATIONS_TREE)
            .map_err(|e| Error::CacheInit(format!("cannot open translations tree: {e}")))?;

        debug!(
            "Opened disk cache at {} ({} translations)",
            path.display(),
            translations.len()
        );

        Ok(Self { translations })
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let value = match self.translations.get(key.as_str()) {
            Ok(value) => value?,
            Err(e) => {
                warn!("Disk cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match String::from_utf8(value.to_vec()) {
            Ok(text) => Some(text),
            Err(_) => {
                warn!("Ignoring corrupt disk cache entry {}", key);
                None
            }
        }
    }

    /// Store a translation and flush it, so short-lived processes keep it.
    pub fn insert(&self, key: &CacheKey, text: &str) -> Result<()> {
        self.translations
            .insert(key.as_str(), text.as_bytes())
            .map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.translations
            .flush()
            .map_err(|e| Error::CacheWrite(format!("flush failed: {e}")))?;
        Ok(())
    }

    /// Remove every translation, returning how many there were.
    pub fn clear(&self) -> Result<usize> {
        let count = self.translations.len();
        self.translations
            .clear()
            .map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.translations
            .flush()
            .map_err(|e| Error::CacheWrite(format!("flush failed: {e}")))?;
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}
