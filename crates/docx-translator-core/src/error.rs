use thiserror::Error;

use crate::docx::TreeError;

/// Unified error type for docx-translator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Document operations (opening the package, parsing XML, saving)
/// - Alignment of the translated text with the extracted paragraphs
/// - Rewriting the paragraph tree
/// - Translation operations (API requests, responses, rate limiting)
/// - Cache and configuration operations
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Document Errors
    // ==========================================================================
    /// Failed to open the DOCX package (not a ZIP archive, unreadable entry)
    #[error("failed to open DOCX: {0}")]
    DocxOpen(String),

    /// A required part is missing from the package
    #[error("DOCX package has no '{0}' part")]
    DocxMissingPart(String),

    /// An XML part could not be parsed
    #[error("failed to parse XML part '{part}': {reason}")]
    XmlParse { part: String, reason: String },

    /// Failed to write the DOCX package back out
    #[error("failed to save DOCX: {0}")]
    DocxSave(String),

    // ==========================================================================
    // Alignment Errors
    // ==========================================================================
    /// The translated text does not split into one segment per paragraph
    #[error(
        "translation has {actual} paragraph segments but the document has {expected} paragraphs"
    )]
    AlignmentMismatch { expected: usize, actual: usize },

    // ==========================================================================
    // Rewrite Errors
    // ==========================================================================
    /// Mutating the paragraph tree failed
    #[error("failed to rewrite paragraph {position}: {source}")]
    RewriteFailed {
        position: usize,
        #[source]
        source: TreeError,
    },

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Translation API request failed
    #[error("translation API request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation API
    #[error("invalid translation API response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation API
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// API key not configured for translation service
    #[error("translation API key not configured")]
    TranslationMissingApiKey,

    /// Translation request timed out
    #[error("translation request timed out")]
    TranslationTimeout,

    /// Maximum retry attempts exceeded for translation
    #[error("translation failed after maximum retries")]
    TranslationMaxRetriesExceeded,

    // ==========================================================================
    // Cache Errors
    // ==========================================================================
    /// Failed to initialize the cache
    #[error("failed to initialize cache: {0}")]
    CacheInit(String),

    /// Failed to write to cache
    #[error("failed to write to cache: {0}")]
    CacheWrite(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`], as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document could not be loaded (malformed or unsupported file)
    ParseFailure,
    /// The translation call failed or timed out
    ProviderFailure,
    /// Translated segment count differs from the paragraph count
    AlignmentMismatch,
    /// The paragraph tree could not be mutated
    RewriteFailed,
    /// Anything else (configuration, cache, I/O, saving)
    Internal,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseFailure => "parse_failure",
            Self::ProviderFailure => "provider_failure",
            Self::AlignmentMismatch => "alignment_mismatch",
            Self::RewriteFailed => "rewrite_failed",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DocxOpen(_) | Self::DocxMissingPart(_) | Self::XmlParse { .. } => {
                ErrorKind::ParseFailure
            }
            Self::TranslationRequest(_)
            | Self::TranslationInvalidResponse(_)
            | Self::TranslationRateLimited { .. }
            | Self::TranslationMissingApiKey
            | Self::TranslationTimeout
            | Self::TranslationMaxRetriesExceeded => ErrorKind::ProviderFailure,
            Self::AlignmentMismatch { .. } => ErrorKind::AlignmentMismatch,
            Self::RewriteFailed { .. } => ErrorKind::RewriteFailed,
            Self::DocxSave(_)
            | Self::CacheInit(_)
            | Self::CacheWrite(_)
            | Self::ConfigLoad(_)
            | Self::ConfigInvalid { .. }
            | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::NodeId;

    #[test]
    fn test_alignment_mismatch_message() {
        let err = Error::AlignmentMismatch { expected: 3, actual: 2 };
        assert_eq!(
            err.to_string(),
            "translation has 2 paragraph segments but the document has 3 paragraphs"
        );
        assert_eq!(err.kind(), ErrorKind::AlignmentMismatch);
    }

    #[test]
    fn test_rewrite_failed_keeps_cause() {
        use std::error::Error as _;

        let err = Error::RewriteFailed {
            position: 4,
            source: TreeError::Detached(NodeId(7)),
        };
        assert_eq!(err.kind(), ErrorKind::RewriteFailed);
        assert!(err.source().is_some(), "cause should be attached");
        assert!(err.to_string().contains("paragraph 4"));
    }

    #[test]
    fn test_provider_kinds() {
        assert_eq!(Error::TranslationTimeout.kind(), ErrorKind::ProviderFailure);
        assert_eq!(
            Error::TranslationRateLimited { retry_after: Some(3) }.to_string(),
            "translation rate limited, retry after 3 seconds"
        );
        assert_eq!(Error::DocxOpen("x".into()).kind(), ErrorKind::ParseFailure);
    }
}
