//! Arena-backed XML tree for DOCX parts.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Ids stay
//! valid for the lifetime of the tree: inserting or detaching nodes never moves
//! existing ones, so a list of ids taken before a batch of insertions still
//! points at the same nodes afterwards.
//!
//! Attribute values are stored raw (already escaped) so that values such as
//! `&#13;&#10;` inside VML attributes survive a round trip unchanged.

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::error::{Error, Result};

/// Index of a node inside an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised by structural mutations of the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The id does not belong to this tree
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// The reference node has no parent to insert next to
    #[error("node {0} is detached from the tree")]
    Detached(NodeId),

    /// The node to insert already has a parent
    #[error("node {0} is already attached")]
    AlreadyAttached(NodeId),

    /// The document node cannot be moved or copied
    #[error("the document node cannot be moved or copied")]
    DocumentRoot,

    /// The insertion would make a node its own ancestor
    #[error("inserting node {0} would create a cycle")]
    Cycle(NodeId),

    /// Children can only be added to elements
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
}

/// Content of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic parent of all top-level nodes
    Document,
    Decl {
        version: String,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Unescaped character data
    Text(String),
    CData(String),
    Comment(String),
    /// Processing instruction, target and content
    PI(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed XML part.
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlTree {
    /// The synthetic document node, parent of the root element.
    pub const DOCUMENT: NodeId = NodeId(0);

    /// Create an empty tree holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse an XML part. `part` is only used in error messages.
    pub fn parse(part: &str, xml: &[u8]) -> Result<Self> {
        let parse_err = |reason: String| Error::XmlParse {
            part: part.to_string(),
            reason,
        };

        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut tree = Self::new();
        let mut open: Vec<NodeId> = vec![Self::DOCUMENT];
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| parse_err(format!("at byte {}: {e}", reader.buffer_position())))?;

            let kind = match event {
                Event::Eof => break,
                Event::Decl(d) => {
                    let version = d.version().map_err(|e| parse_err(e.to_string()))?;
                    NodeKind::Decl {
                        version: bytes_to_string(version),
                        encoding: d.encoding().and_then(|r| r.ok()).map(bytes_to_string),
                        standalone: d.standalone().and_then(|r| r.ok()).map(bytes_to_string),
                    }
                }
                Event::Start(s) => {
                    let parent = open.last().copied().unwrap_or(Self::DOCUMENT);
                    let id = tree.push(element_kind(&s).map_err(parse_err)?);
                    tree.link(parent, id);
                    open.push(id);
                    continue;
                }
                Event::End(_) => {
                    if open.len() <= 1 {
                        return Err(parse_err("unexpected closing tag".to_string()));
                    }
                    open.pop();
                    continue;
                }
                Event::Empty(s) => element_kind(&s).map_err(parse_err)?,
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| parse_err(e.to_string()))?;
                    NodeKind::Text(text.into_owned())
                }
                Event::CData(t) => NodeKind::CData(bytes_to_string(t.into_inner())),
                Event::Comment(t) => NodeKind::Comment(bytes_to_string(t.into_inner())),
                Event::PI(t) => NodeKind::PI(format!(
                    "{}{}",
                    bytes_to_string(t.target()),
                    bytes_to_string(t.content())
                )),
                Event::DocType(t) => NodeKind::DocType(bytes_to_string(t.into_inner())),
            };

            let parent = open.last().copied().unwrap_or(Self::DOCUMENT);
            let id = tree.push(kind);
            tree.link(parent, id);
        }

        if open.len() > 1 {
            return Err(parse_err(format!(
                "{} element(s) left unclosed",
                open.len() - 1
            )));
        }

        Ok(tree)
    }

    /// Serialize the tree back to XML bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for &child in self.children(Self::DOCUMENT) {
            self.write_node(&mut out, child)?;
        }
        Ok(out)
    }

    fn write_node(&self, out: &mut Vec<u8>, id: NodeId) -> Result<()> {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Document => {}
            NodeKind::Decl {
                version,
                encoding,
                standalone,
            } => {
                let decl =
                    BytesDecl::new(version.as_str(), encoding.as_deref(), standalone.as_deref());
                let mut writer = quick_xml::Writer::new(Vec::new());
                writer
                    .write_event(Event::Decl(decl))
                    .map_err(|e| Error::DocxSave(format!("failed to write declaration: {e}")))?;
                out.extend_from_slice(&writer.into_inner());
            }
            NodeKind::Element { name, attrs } => {
                out.push(b'<');
                out.extend_from_slice(name.as_bytes());
                for (key, value) in attrs {
                    out.push(b' ');
                    out.extend_from_slice(key.as_bytes());
                    out.extend_from_slice(b"=\"");
                    out.extend_from_slice(value.as_bytes());
                    out.push(b'"');
                }
                if node.children.is_empty() {
                    out.extend_from_slice(b"/>");
                } else {
                    out.push(b'>');
                    for &child in &node.children {
                        self.write_node(out, child)?;
                    }
                    out.extend_from_slice(b"</");
                    out.extend_from_slice(name.as_bytes());
                    out.push(b'>');
                }
            }
            NodeKind::Text(text) => escape_text_into(out, text),
            NodeKind::CData(text) => {
                out.extend_from_slice(b"<![CDATA[");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"]]>");
            }
            NodeKind::Comment(text) => {
                out.extend_from_slice(b"<!--");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"-->");
            }
            NodeKind::PI(content) => {
                out.extend_from_slice(b"<?");
                out.extend_from_slice(content.as_bytes());
                out.extend_from_slice(b"?>");
            }
            NodeKind::DocType(text) => {
                out.extend_from_slice(b"<!DOCTYPE ");
                out.extend_from_slice(text.as_bytes());
                out.push(b'>');
            }
        }
        Ok(())
    }

    // =========================================================================
    // Read access
    // =========================================================================

    fn get(&self, id: NodeId) -> std::result::Result<&Node, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    /// Qualified name of an element (`w:p`), `None` for other nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element_named(&self, id: NodeId, expected: &str) -> bool {
        self.name(id) == Some(expected)
    }

    /// Raw (still escaped) attribute value.
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// First element of the part (e.g. `w:document`).
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(Self::DOCUMENT)
            .iter()
            .copied()
            .find(|&c| self.name(c).is_some())
    }

    pub fn first_child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.is_element_named(c, name))
    }

    /// All descendants of `id` in depth-first pre-order (document order).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Concatenated text and CDATA of all descendants.
    pub fn text(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|d| match self.kind(d) {
                Some(NodeKind::Text(t) | NodeKind::CData(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of nodes reachable from the document node.
    pub fn attached_len(&self) -> usize {
        self.descendants(Self::DOCUMENT).len()
    }

    /// Structural deep equality of two subtrees.
    pub fn subtree_eq(&self, a: NodeId, b: NodeId) -> bool {
        match (self.nodes.get(a.0), self.nodes.get(b.0)) {
            (Some(na), Some(nb)) => {
                na.kind == nb.kind
                    && na.children.len() == nb.children.len()
                    && na
                        .children
                        .iter()
                        .zip(&nb.children)
                        .all(|(&ca, &cb)| self.subtree_eq(ca, cb))
            }
            _ => false,
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: impl Into<String>, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeKind::Element {
            name: name.into(),
            attrs,
        })
    }

    /// Create a detached text node holding unescaped text.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Set (or add) a raw attribute value on an element.
    pub fn set_attr(
        &mut self,
        id: NodeId,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), TreeError> {
        self.get(id)?;
        match &mut self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => {
                if let Some(slot) = attrs.iter_mut().find(|(k, _)| k == key) {
                    slot.1 = value.to_string();
                } else {
                    attrs.push((key.to_string(), value.to_string()));
                }
                Ok(())
            }
            _ => Err(TreeError::NotAnElement(id)),
        }
    }

    /// Checks shared by every insertion: `new_node` exists, is free, and is not
    /// an ancestor of (or equal to) the node it is going under.
    fn check_insertable(
        &self,
        anchor: NodeId,
        new_node: NodeId,
    ) -> std::result::Result<(), TreeError> {
        if new_node == Self::DOCUMENT {
            return Err(TreeError::DocumentRoot);
        }
        if self.get(new_node)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(new_node));
        }
        let mut cursor = Some(anchor);
        while let Some(current) = cursor {
            if current == new_node {
                return Err(TreeError::Cycle(new_node));
            }
            cursor = self.parent(current);
        }
        Ok(())
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> std::result::Result<(), TreeError> {
        match self.get(parent)?.kind {
            NodeKind::Element { .. } | NodeKind::Document => {}
            _ => return Err(TreeError::NotAnElement(parent)),
        }
        self.check_insertable(parent, child)?;
        self.link(parent, child);
        Ok(())
    }

    /// Insert a detached node as the next sibling of `reference`.
    pub fn insert_after(
        &mut self,
        reference: NodeId,
        new_node: NodeId,
    ) -> std::result::Result<(), TreeError> {
        let parent = self
            .get(reference)?
            .parent
            .ok_or(TreeError::Detached(reference))?;
        self.check_insertable(parent, new_node)?;

        let siblings = &mut self.nodes[parent.0].children;
        let position = siblings
            .iter()
            .position(|&c| c == reference)
            .ok_or(TreeError::Detached(reference))?;
        siblings.insert(position + 1, new_node);
        self.nodes[new_node.0].parent = Some(parent);
        Ok(())
    }

    /// Remove a node (and its subtree) from its parent. The id stays valid.
    pub fn detach(&mut self, id: NodeId) -> std::result::Result<(), TreeError> {
        if id == Self::DOCUMENT {
            return Err(TreeError::DocumentRoot);
        }
        let parent = self.get(id)?.parent.ok_or(TreeError::Detached(id))?;
        self.nodes[parent.0].children.retain(|&c| c != id);
        self.nodes[id.0].parent = None;
        Ok(())
    }

    /// Replace all children of an element with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> std::result::Result<(), TreeError> {
        if !matches!(self.get(id)?.kind, NodeKind::Element { .. }) {
            return Err(TreeError::NotAnElement(id));
        }
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.link(id, text_node);
        }
        Ok(())
    }

    /// Copy a subtree. The copy is detached and shares nothing with the source.
    pub fn deep_clone(&mut self, id: NodeId) -> std::result::Result<NodeId, TreeError> {
        if id == Self::DOCUMENT {
            return Err(TreeError::DocumentRoot);
        }
        let source = self.get(id)?;
        let kind = source.kind.clone();
        let children = source.children.clone();

        let copy = self.push(kind);
        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.link(copy, child_copy);
        }
        Ok(copy)
    }
}

fn element_kind(s: &BytesStart<'_>) -> std::result::Result<NodeKind, String> {
    let mut attrs = Vec::new();
    for attr in s.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        attrs.push((
            bytes_to_string(attr.key.as_ref()),
            bytes_to_string(attr.value.as_ref()),
        ));
    }
    Ok(NodeKind::Element {
        name: bytes_to_string(s.name().as_ref()),
        attrs,
    })
}

fn bytes_to_string(bytes: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(bytes.as_ref()).into_owned()
}

fn escape_text_into(out: &mut Vec<u8>, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.extend_from_slice(b"&amp;"),
            '<' => out.extend_from_slice(b"&lt;"),
            '>' => out.extend_from_slice(b"&gt;"),
            _ => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}
