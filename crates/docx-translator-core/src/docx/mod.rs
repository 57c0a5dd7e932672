mod document;
mod extract;
mod package;
mod rewrite;
mod tree;

pub use document::{DocxDocument, DEFAULT_MAIN_PART};
pub use extract::{Paragraph, ParagraphExtractor, join_paragraphs};
pub use package::{DocxPackage, PackageEntry};
pub use rewrite::{DocumentRewriter, RenderMode};
pub use tree::{NodeId, NodeKind, TreeError, XmlTree};
