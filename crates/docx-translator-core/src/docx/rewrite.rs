//! Applying aligned translations back onto the paragraph tree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::document::DocxDocument;
use super::extract::{
    Paragraph, W_P, W_PPR, W_R, W_RPR, W_SECTPR, W_T, run_content, text_elements,
};
use super::tree::{NodeId, TreeError, XmlTree};
use crate::error::{Error, Result};

/// How translations are written into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Each paragraph's text is replaced by its translation
    #[default]
    TranslatedOnly,
    /// A translated copy follows each original paragraph
    Bilingual,
}

impl RenderMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TranslatedOnly => "translated",
            Self::Bilingual => "bilingual",
        }
    }

    /// Interpret a boolean-ish request flag (`bilingual=true`).
    pub fn from_flag(flag: &str) -> Result<Self> {
        match flag.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Self::Bilingual),
            "false" | "0" | "no" | "off" | "" => Ok(Self::TranslatedOnly),
            other => Err(Error::ConfigInvalid {
                field: "bilingual".to_string(),
                reason: format!("expected a boolean, got '{other}'"),
            }),
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RenderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "translated" | "translated_only" | "translated-only" => Ok(Self::TranslatedOnly),
            "bilingual" => Ok(Self::Bilingual),
            other => Err(Error::ConfigInvalid {
                field: "render_mode".to_string(),
                reason: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Writes translations into a document in place.
pub struct DocumentRewriter<'a> {
    tree: &'a mut XmlTree,
}

impl<'a> DocumentRewriter<'a> {
    pub const fn new(doc: &'a mut DocxDocument) -> Self {
        Self {
            tree: doc.tree_mut(),
        }
    }

    pub const fn from_tree(tree: &'a mut XmlTree) -> Self {
        Self { tree }
    }

    /// Apply `translations[i]` to `paragraphs[i]`.
    ///
    /// `paragraphs` is the snapshot taken by the extractor before any change;
    /// node ids stay valid while new paragraphs are inserted, so each original
    /// paragraph is visited exactly once.
    pub fn rewrite(
        &mut self,
        paragraphs: &[Paragraph],
        translations: &[String],
        mode: RenderMode,
    ) -> Result<()> {
        if paragraphs.len() != translations.len() {
            return Err(Error::AlignmentMismatch {
                expected: paragraphs.len(),
                actual: translations.len(),
            });
        }

        debug!("Rewriting {} paragraphs ({})", paragraphs.len(), mode);

        for (paragraph, translation) in paragraphs.iter().zip(translations) {
            let outcome = match mode {
                RenderMode::TranslatedOnly => self.replace_text(paragraph.node, translation),
                RenderMode::Bilingual => self
                    .insert_translation(paragraph.node, translation)
                    .map(|_| ()),
            };
            outcome.map_err(|source| Error::RewriteFailed {
                position: paragraph.position,
                source,
            })?;
        }

        Ok(())
    }

    /// Put the whole translation in the paragraph's first text element and
    /// drop the rest of the run content (other `w:t`, tabs, line breaks),
    /// since the translation already accounts for it. Paragraph and run
    /// properties stay where they are.
    fn replace_text(&mut self, paragraph: NodeId, text: &str) -> std::result::Result<(), TreeError> {
        let content = run_content(self.tree, paragraph);
        let first = content
            .iter()
            .copied()
            .find(|&node| self.tree.is_element_named(node, W_T));

        for &other in &content {
            if Some(other) != first {
                self.tree.detach(other)?;
            }
        }

        match first {
            Some(first) => {
                self.tree.set_text(first, text)?;
                if has_edge_whitespace(text) {
                    self.tree.set_attr(first, "xml:space", "preserve")?;
                }
            }
            None if !text.is_empty() => {
                let run = self.new_run(None, text)?;
                self.tree.append_child(paragraph, run)?;
            }
            None => {}
        }
        Ok(())
    }

    /// Insert a new paragraph holding `text` right after `source`, carrying
    /// copies of its paragraph properties and of its first run's properties.
    fn insert_translation(
        &mut self,
        source: NodeId,
        text: &str,
    ) -> std::result::Result<NodeId, TreeError> {
        let new_paragraph = self.tree.create_element(W_P, Vec::new());

        if let Some(ppr) = self.tree.first_child_named(source, W_PPR) {
            let copy = self.tree.deep_clone(ppr)?;
            // The section break stays with the source paragraph only
            if let Some(section) = self.tree.first_child_named(copy, W_SECTPR) {
                self.tree.detach(section)?;
            }
            self.tree.append_child(new_paragraph, copy)?;
        }

        if !text.is_empty() {
            let rpr = self.first_run_properties(source);
            let run = self.new_run(rpr, text)?;
            self.tree.append_child(new_paragraph, run)?;
        }

        self.tree.insert_after(source, new_paragraph)?;
        Ok(new_paragraph)
    }

    /// `w:rPr` of the run holding the paragraph's first text.
    fn first_run_properties(&self, paragraph: NodeId) -> Option<NodeId> {
        let first_text = text_elements(self.tree, paragraph).into_iter().next()?;
        let run = self.tree.parent(first_text)?;
        if !self.tree.is_element_named(run, W_R) {
            return None;
        }
        self.tree.first_child_named(run, W_RPR)
    }

    /// Build a detached `w:r` with an optional copy of `rpr` and one `w:t`.
    fn new_run(
        &mut self,
        rpr: Option<NodeId>,
        text: &str,
    ) -> std::result::Result<NodeId, TreeError> {
        let run = self.tree.create_element(W_R, Vec::new());
        if let Some(rpr) = rpr {
            let copy = self.tree.deep_clone(rpr)?;
            self.tree.append_child(run, copy)?;
        }

        let t = self.tree.create_element(
            W_T,
            vec![("xml:space".to_string(), "preserve".to_string())],
        );
        let content = self.tree.create_text(text);
        self.tree.append_child(t, content)?;
        self.tree.append_child(run, t)?;
        Ok(run)
    }
}

/// Word trims leading and trailing spaces of `w:t` unless told otherwise.
fn has_edge_whitespace(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}
