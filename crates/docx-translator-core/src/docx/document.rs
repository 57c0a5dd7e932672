use std::collections::HashMap;

use tracing::debug;

use super::package::DocxPackage;
use super::tree::XmlTree;
use crate::error::{Error, Result};

/// Main document part used when the package relationships do not name one.
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

const PACKAGE_RELS: &str = "_rels/.rels";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// A loaded Word document: the package plus the parsed main document part.
///
/// Only the main part is parsed; headers, footers, footnotes and every other
/// part are carried through untouched.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    package: DocxPackage,
    main_part: String,
    tree: XmlTree,
}

impl DocxDocument {
    /// Load a document from the bytes of a `.docx` file.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let package = DocxPackage::from_bytes(bytes)?;
        let main_part = main_part_name(&package);

        let xml = package
            .part(&main_part)
            .ok_or_else(|| Error::DocxMissingPart(main_part.clone()))?;
        let tree = XmlTree::parse(&main_part, xml)?;

        debug!("Loaded {} ({} nodes)", main_part, tree.attached_len());

        Ok(Self {
            package,
            main_part,
            tree,
        })
    }

    /// Serialize the (possibly modified) document back to `.docx` bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut replacements = HashMap::new();
        replacements.insert(self.main_part.clone(), self.tree.serialize()?);
        self.package.to_bytes(&replacements)
    }

    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub const fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub const fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }
}

/// Resolve the main document part from `_rels/.rels`, falling back to
/// `word/document.xml`.
fn main_part_name(package: &DocxPackage) -> String {
    let Some(rels) = package.part(PACKAGE_RELS) else {
        return DEFAULT_MAIN_PART.to_string();
    };
    let Ok(tree) = XmlTree::parse(PACKAGE_RELS, rels) else {
        return DEFAULT_MAIN_PART.to_string();
    };
    let Some(root) = tree.root_element() else {
        return DEFAULT_MAIN_PART.to_string();
    };

    tree.children(root)
        .iter()
        .copied()
        .filter(|&rel| tree.is_element_named(rel, "Relationship"))
        .find(|&rel| {
            tree.attr(rel, "Type")
                .is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_REL))
        })
        .and_then(|rel| tree.attr(rel, "Target"))
        .map(|target| target.trim_start_matches('/').to_string())
        .filter(|target| package.part(target).is_some())
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Hi</w:t></w:r></w:p></w:body></w:document>"#;

    fn build(files: &[(&str, &str)]) -> Vec<u8> {
        let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in files {
            zout.start_file(*name, SimpleFileOptions::default()).unwrap();
            zout.write_all(body.as_bytes()).unwrap();
        }
        zout.finish().unwrap().into_inner()
    }

    #[test]
    fn test_load_default_main_part() {
        let doc = DocxDocument::load(&build(&[("word/document.xml", BODY)])).unwrap();
        assert_eq!(doc.main_part(), DEFAULT_MAIN_PART);
        let root = doc.tree().root_element().unwrap();
        assert_eq!(doc.tree().name(root), Some("w:document"));
    }

    #[test]
    fn test_main_part_from_relationships() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="/word/main.xml"/></Relationships>"#;
        let doc = DocxDocument::load(&build(&[("_rels/.rels", rels), ("word/main.xml", BODY)]))
            .unwrap();
        assert_eq!(doc.main_part(), "word/main.xml");
    }

    #[test]
    fn test_missing_main_part() {
        let result = DocxDocument::load(&build(&[("other.xml", "<x/>")]));
        assert!(matches!(result, Err(Error::DocxMissingPart(_))));
    }

    #[test]
    fn test_serialize_unmodified_round_trip() {
        let bytes = build(&[("word/document.xml", BODY), ("word/styles.xml", "<s/>")]);
        let doc = DocxDocument::load(&bytes).unwrap();
        let out = DocxDocument::load(&doc.serialize().unwrap()).unwrap();
        assert_eq!(out.tree().serialize().unwrap(), BODY.as_bytes());
    }
}
