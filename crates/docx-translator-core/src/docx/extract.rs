//! Paragraph extraction from the main document part.
//!
//! Paragraphs are visited depth-first in document order, which is also the
//! order they are serialized in. That order is the key used to line up the
//! translated text with the paragraphs it belongs to.

use super::document::DocxDocument;
use super::tree::{NodeId, XmlTree};
use crate::align::PARAGRAPH_MARKER;

pub(crate) const W_BODY: &str = "w:body";
pub(crate) const W_P: &str = "w:p";
pub(crate) const W_R: &str = "w:r";
pub(crate) const W_T: &str = "w:t";
pub(crate) const W_PPR: &str = "w:pPr";
pub(crate) const W_RPR: &str = "w:rPr";
pub(crate) const W_SECTPR: &str = "w:sectPr";
const W_TAB: &str = "w:tab";
const W_BR: &str = "w:br";
const W_CR: &str = "w:cr";

/// Containers whose paragraphs are left alone: tables and text boxes.
const SKIPPED_CONTAINERS: [&str; 2] = ["w:tbl", "w:txbxContent"];

/// A paragraph of the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// The `w:p` element
    pub node: NodeId,
    /// Plain text of all runs, in order
    pub text: String,
    /// Index among extracted paragraphs
    pub position: usize,
}

/// Read-only pass over a document collecting its paragraphs.
pub struct ParagraphExtractor<'a> {
    tree: &'a XmlTree,
}

impl<'a> ParagraphExtractor<'a> {
    pub const fn new(doc: &'a DocxDocument) -> Self {
        Self { tree: doc.tree() }
    }

    pub const fn from_tree(tree: &'a XmlTree) -> Self {
        Self { tree }
    }

    /// Collect every body paragraph in document order.
    ///
    /// An empty document yields an empty list.
    pub fn extract(&self) -> Vec<Paragraph> {
        let tree = self.tree;
        let start = tree
            .root_element()
            .map_or(XmlTree::DOCUMENT, |root| {
                tree.first_child_named(root, W_BODY).unwrap_or(root)
            });

        let mut paragraphs = Vec::new();
        let mut stack: Vec<NodeId> = tree.children(start).iter().rev().copied().collect();

        while let Some(node) = stack.pop() {
            match tree.name(node) {
                Some(W_P) => {
                    paragraphs.push(Paragraph {
                        node,
                        text: self.paragraph_text(node),
                        position: paragraphs.len(),
                    });
                }
                Some(name) if SKIPPED_CONTAINERS.contains(&name) => {}
                Some(_) => stack.extend(tree.children(node).iter().rev().copied()),
                None => {}
            }
        }

        paragraphs
    }

    /// Texts only, in extraction order.
    pub fn extract_texts(&self) -> Vec<String> {
        self.extract().into_iter().map(|p| p.text).collect()
    }

    /// Plain text of one paragraph, built from its run content in order.
    ///
    /// `w:t` contributes its text, `w:tab` a tab, and `w:br`/`w:cr` a space.
    /// Line breaks never survive as `'\n'`, so they cannot be mistaken for
    /// paragraph boundaries.
    pub fn paragraph_text(&self, paragraph: NodeId) -> String {
        let mut text = String::new();
        for node in run_content(self.tree, paragraph) {
            match self.tree.name(node) {
                Some(W_T) => text.push_str(&self.tree.text(node)),
                Some(W_TAB) => text.push('\t'),
                _ => text.push(' '),
            }
        }
        text.replace(['\r', '\n'], " ")
    }
}

/// Text-bearing run content of `paragraph` in document order: `w:t`,
/// `w:tab`, `w:cr` and text-wrapping `w:br`.
///
/// Properties are not descended into (`w:pPr` holds tab stops named `w:tab`),
/// and neither are nested paragraphs or text boxes. Page and column breaks
/// are layout, not text, and are left out.
pub(crate) fn run_content(tree: &XmlTree, paragraph: NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(paragraph).iter().rev().copied().collect();

    while let Some(node) = stack.pop() {
        match tree.name(node) {
            Some(W_T | W_TAB | W_CR) => found.push(node),
            Some(W_BR) => {
                if tree
                    .attr(node, "w:type")
                    .is_none_or(|kind| kind == "textWrapping")
                {
                    found.push(node);
                }
            }
            Some(W_P | W_PPR | W_RPR) => {}
            Some(name) if SKIPPED_CONTAINERS.contains(&name) => {}
            Some(_) => stack.extend(tree.children(node).iter().rev().copied()),
            None => {}
        }
    }

    found
}

/// `w:t` elements that belong to `paragraph`, in document order.
pub(crate) fn text_elements(tree: &XmlTree, paragraph: NodeId) -> Vec<NodeId> {
    run_content(tree, paragraph)
        .into_iter()
        .filter(|&node| tree.is_element_named(node, W_T))
        .collect()
}

/// Join paragraph texts with the boundary marker for the outbound call.
pub fn join_paragraphs(paragraphs: &[Paragraph]) -> String {
    let mut joined = String::new();
    for (i, paragraph) in paragraphs.iter().enumerate() {
        if i > 0 {
            joined.push(PARAGRAPH_MARKER);
        }
        joined.push_str(&paragraph.text);
    }
    joined
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tree(body: &str) -> XmlTree {
        let xml = format!(
            r#"<w:document xmlns:w="urn:w"><w:body>{body}<w:sectPr/></w:body></w:document>"#
        );
        XmlTree::parse("word/document.xml", xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_runs_concatenate_in_order() {
        let t = tree(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>Hel</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">lo </w:t></w:r><w:hyperlink><w:r><w:t>there</w:t></w:r></w:hyperlink></w:p>"#,
        );
        let texts = ParagraphExtractor::from_tree(&t).extract_texts();
        assert_eq!(texts, vec!["Hello there"]);
    }

    #[test]
    fn test_positions_follow_document_order() {
        let t = tree("<w:p><w:r><w:t>a</w:t></w:r></w:p><w:p/><w:sdt><w:sdtContent><w:p><w:r><w:t>c</w:t></w:r></w:p></w:sdtContent></w:sdt>");
        let paragraphs = ParagraphExtractor::from_tree(&t).extract();
        let summary: Vec<_> = paragraphs
            .iter()
            .map(|p| (p.position, p.text.as_str()))
            .collect();
        assert_eq!(summary, vec![(0, "a"), (1, ""), (2, "c")]);
    }

    #[test]
    fn test_tables_are_skipped() {
        let t = tree("<w:p><w:r><w:t>before</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>after</w:t></w:r></w:p>");
        let texts = ParagraphExtractor::from_tree(&t).extract_texts();
        assert_eq!(texts, vec!["before", "after"]);
    }

    #[test]
    fn test_text_box_content_is_not_part_of_paragraph() {
        let t = tree("<w:p><w:r><w:t>outer</w:t></w:r><w:r><w:drawing><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r></w:p>");
        let texts = ParagraphExtractor::from_tree(&t).extract_texts();
        assert_eq!(texts, vec!["outer"]);
    }

    #[test]
    fn test_no_paragraphs_is_empty() {
        let t = tree("");
        assert!(ParagraphExtractor::from_tree(&t).extract().is_empty());
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let t = tree("<w:p><w:r><w:t>one</w:t></w:r></w:p><w:p><w:r><w:t>two</w:t></w:r></w:p>");
        let extractor = ParagraphExtractor::from_tree(&t);
        assert_eq!(extractor.extract(), extractor.extract());
    }

    #[test]
    fn test_embedded_newlines_become_spaces() {
        let t = tree("<w:p><w:r><w:t>line&#10;break</w:t></w:r></w:p>");
        let texts = ParagraphExtractor::from_tree(&t).extract_texts();
        assert_eq!(texts, vec!["line break"]);
    }

    #[test]
    fn test_tabs_and_breaks_are_not_dropped() {
        let t = tree(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Name:</w:t><w:tab/><w:t>John</w:t><w:br/><w:t>Smith</w:t><w:cr/><w:t>Jr</w:t></w:r></w:p>"#,
        );
        let texts = ParagraphExtractor::from_tree(&t).extract_texts();
        assert_eq!(texts, vec!["Name:\tJohn Smith Jr"]);
    }

    #[test]
    fn test_page_break_is_not_text() {
        let t = tree(r#"<w:p><w:r><w:t>end</w:t><w:br w:type="page"/></w:r></w:p>"#);
        let paragraph = ParagraphExtractor::from_tree(&t).extract().remove(0);
        assert_eq!(paragraph.text, "end");
        assert_eq!(run_content(&t, paragraph.node).len(), 1);
    }

    #[test]
    fn test_join_uses_marker_without_trailing() {
        let t = tree("<w:p><w:r><w:t>Hello</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>World</w:t></w:r></w:p>");
        let paragraphs = ParagraphExtractor::from_tree(&t).extract();
        assert_eq!(join_paragraphs(&paragraphs), "Hello\n\nWorld");
    }
}
