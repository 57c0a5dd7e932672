use crate::config::Lang;

/// Cache key for a translated document text.
///
/// Keys are opaque MD5 hashes of everything that affects the provider's
/// output: the joined paragraph text, the translator and both languages.
/// The render mode is not part of the key since it is applied after
/// translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hash: String,
}

impl CacheKey {
    pub fn new(text: &str, translator: &str, source_lang: &Lang, target_lang: &Lang) -> Self {
        // Null byte separators keep ("a", "bc") and ("ab", "c") apart
        let combined = format!(
            "{}\0{}\0{}\0{}",
            text,
            translator.to_lowercase(),
            source_lang.as_str(),
            target_lang.as_str(),
        );

        Self {
            hash: format!("{:x}", md5::compute(combined.as_bytes())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hash)
    }
}
