//! Splitting the provider's translated text back into paragraphs.
//!
//! The outbound text is the paragraphs joined by [`PARAGRAPH_MARKER`]. The
//! reply is split on the same marker, strictly: no attempt is made to
//! re-detect paragraphs from the content. A reply whose segment count differs
//! from the paragraph count is rejected so that no translation ever lands on
//! the wrong paragraph.

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Boundary between paragraphs in the text sent to the provider.
pub const PARAGRAPH_MARKER: char = '\n';

/// Split `translated` into exactly `expected` segments.
///
/// Empty segments (blank paragraphs) are kept in place. Two provider quirks
/// are tolerated: CRLF line endings, and a single extra newline at the very
/// end of the reply.
pub fn align(translated: &str, expected: usize) -> Result<Vec<String>> {
    if expected == 0 {
        return if translated.trim().is_empty() {
            Ok(Vec::new())
        } else {
            warn!("Provider returned text for a document without paragraphs");
            Err(Error::AlignmentMismatch {
                expected,
                actual: translated.split(PARAGRAPH_MARKER).count(),
            })
        };
    }

    let mut segments: Vec<String> = translated
        .split(PARAGRAPH_MARKER)
        .map(|s| s.strip_suffix('\r').unwrap_or(s).to_string())
        .collect();

    if segments.len() == expected + 1 && segments.last().is_some_and(String::is_empty) {
        debug!("Dropping trailing newline from translation");
        segments.pop();
    }

    if segments.len() != expected {
        warn!(
            "Alignment mismatch: {} segments for {} paragraphs",
            segments.len(),
            expected
        );
        return Err(Error::AlignmentMismatch {
            expected,
            actual: segments.len(),
        });
    }

    Ok(segments)
}
