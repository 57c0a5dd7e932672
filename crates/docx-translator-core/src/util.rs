//! Utility functions shared across the crate.

use std::path::{Path, PathBuf};

use crate::cache::DiskCache;
use crate::config::Lang;
use crate::docx::RenderMode;
use crate::error::Result;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Get the user's cache directory following XDG conventions.
///
/// Returns `$XDG_CACHE_HOME` if set, otherwise `$HOME/.cache`.
pub fn cache_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
}

/// Get the default translation cache path.
pub fn translation_cache_path() -> PathBuf {
    cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("docx-translator")
}

/// Clear the translation cache on disk.
///
/// Returns the number of entries cleared.
pub fn clear_translation_cache() -> Result<usize> {
    let cache_path = translation_cache_path();

    if !cache_path.exists() {
        return Ok(0);
    }

    DiskCache::open(&cache_path)?.clear()
}

/// Output file name for a translated document: `report.docx` becomes
/// `report-fr.docx`, or `report-fr-bilingual.docx` in bilingual mode.
pub fn translated_file_name(original: &str, target: &Lang, mode: RenderMode) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");

    match mode {
        RenderMode::TranslatedOnly => format!("{stem}-{target}.docx"),
        RenderMode::Bilingual => format!("{stem}-{target}-bilingual.docx"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translated_file_name() {
        let fr = Lang::new("fr");
        assert_eq!(
            translated_file_name("report.docx", &fr, RenderMode::TranslatedOnly),
            "report-fr.docx"
        );
        assert_eq!(
            translated_file_name("dir/report.docx", &fr, RenderMode::Bilingual),
            "report-fr-bilingual.docx"
        );
        assert_eq!(
            translated_file_name("", &fr, RenderMode::TranslatedOnly),
            "document-fr.docx"
        );
    }
}
