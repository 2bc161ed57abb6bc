//! Document tree consumed by the mapper.
//!
//! A [`Node`] is one parsed unit of the input: a tagged scalar, a tagged
//! ordered sequence of nodes, or a tagged ordered list of key/value node
//! pairs. Every node carries the source [`Span`] it was parsed from, which is
//! what structural errors point at. The tree is produced by [`compose`] from
//! `yaml-rust2` events and owned by a [`Document`] for the duration of one
//! `load` call; schemas only ever borrow it.

mod compose;
pub(crate) mod resolver;

pub use compose::compose;

use serde::Serialize;
use std::fmt;

/// Well-known YAML core schema tags.
pub mod tags {
    pub const PREFIX: &str = "tag:yaml.org,2002:";
    pub const STR: &str = "tag:yaml.org,2002:str";
    pub const INT: &str = "tag:yaml.org,2002:int";
    pub const FLOAT: &str = "tag:yaml.org,2002:float";
    pub const BOOL: &str = "tag:yaml.org,2002:bool";
    pub const NULL: &str = "tag:yaml.org,2002:null";
    pub const SEQ: &str = "tag:yaml.org,2002:seq";
    pub const MAP: &str = "tag:yaml.org,2002:map";
}

/// A position in the source text. `index` is the offset used for diagnostic
/// labels; `line` is 1-based, `col` 0-based, matching the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Pos {
    pub index: usize,
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.col + 1)
    }
}

/// The region of source text a node was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub(crate) fn to_source_span(self) -> miette::SourceSpan {
        let len = self.end.index.saturating_sub(self.start.index).max(1);
        (self.start.index, len).into()
    }
}

/// Payload of a node: scalar text, ordered items, or ordered key/value pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(String),
    Sequence(Vec<Node>),
    Mapping(Vec<(Node, Node)>),
}

/// One parsed unit of the input document.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: String,
    kind: NodeKind,
    span: Span,
}

impl Node {
    pub fn new(tag: impl Into<String>, kind: NodeKind, span: Span) -> Self {
        Self {
            tag: tag.into(),
            kind,
            span,
        }
    }

    /// The node's resolved type tag, e.g. `tag:yaml.org,2002:str`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Raw text of a scalar node; `None` for collections.
    pub fn scalar_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Items of a sequence node; `None` otherwise.
    pub fn items(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Key/value pairs of a mapping node, in document order; `None` otherwise.
    pub fn pairs(&self) -> Option<&[(Node, Node)]> {
        match &self.kind {
            NodeKind::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }
}

/// Owner of one parsed document tree.
///
/// Exists so teardown is iterative: a document nested tens of thousands of
/// levels deep must not overflow the call stack when dropped, mirroring the
/// stack-safety guarantee of the mapper itself.
#[derive(Debug)]
pub struct Document {
    root: Option<Node>,
}

impl Document {
    pub(crate) fn new(root: Option<Node>) -> Self {
        Self { root }
    }

    /// The single root node, or `None` for an empty document.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        let mut work = Vec::new();
        work.extend(self.root.take());
        while let Some(node) = work.pop() {
            match node.kind {
                NodeKind::Scalar(_) => {}
                NodeKind::Sequence(items) => work.extend(items),
                NodeKind::Mapping(pairs) => {
                    for (key, value) in pairs {
                        work.push(key);
                        work.push(value);
                    }
                }
            }
        }
    }
}
