//! Folds `yaml-rust2` marked events into a [`Document`] tree.
//!
//! The event parser owns all text-level concerns; this module only stacks
//! open collections, resolves implicit tags for plain scalars, and expands
//! anchors/aliases. Aliases are expanded into independent copies of the
//! anchored node, so the resulting tree never shares subtrees and the mapper
//! re-matches every reference at its own position.

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use super::{resolver, tags, Document, Node, NodeKind, Pos, Span};
use crate::errors::MapError;

/// Parses `source` into a document tree.
///
/// Empty input yields a document with no root. More than one document in the
/// stream is an error; the mapper consumes exactly one.
pub fn compose(source: &str) -> Result<Document, MapError> {
    let mut builder = TreeBuilder::default();
    let mut parser = Parser::new_from_str(source);
    let loaded = parser.load(&mut builder, true).map_err(MapError::scan);
    // Hand the tree to Document before bailing out, so even error paths tear
    // it down iteratively.
    let document = Document::new(builder.root.take());
    loaded?;
    if let Some(error) = builder.error {
        return Err(error);
    }
    if builder.documents > 1 {
        return Err(MapError::multiple_documents());
    }
    Ok(document)
}

enum Open {
    Sequence {
        tag: String,
        start: Pos,
        anchor: usize,
        items: Vec<Node>,
    },
    Mapping {
        tag: String,
        start: Pos,
        anchor: usize,
        pending: Option<Node>,
        pairs: Vec<(Node, Node)>,
    },
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Open>,
    anchors: HashMap<usize, Node>,
    root: Option<Node>,
    documents: usize,
    error: Option<MapError>,
}

fn pos(mark: Marker) -> Pos {
    Pos {
        index: mark.index(),
        line: mark.line(),
        col: mark.col(),
    }
}

fn point(mark: Marker) -> Span {
    Span {
        start: pos(mark),
        end: pos(mark),
    }
}

fn explicit_tag(tag: &Tag) -> String {
    format!("{}{}", tag.handle, tag.suffix)
}

impl TreeBuilder {
    /// Attaches a completed node to the innermost open collection, or makes
    /// it a document root.
    fn finish(&mut self, node: Node, anchor: usize) {
        if anchor != 0 {
            self.anchors.insert(anchor, node.clone());
        }
        match self.stack.last_mut() {
            Some(Open::Sequence { items, .. }) => items.push(node),
            Some(Open::Mapping { pending, pairs, .. }) => match pending.take() {
                None => *pending = Some(node),
                Some(key) => pairs.push((key, node)),
            },
            None => {
                self.documents += 1;
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
    }

    fn fail(&mut self, error: MapError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        match event {
            Event::Scalar(value, style, anchor, tag) => {
                let tag = match &tag {
                    Some(tag) => explicit_tag(tag),
                    None if matches!(style, TScalarStyle::Plain) => {
                        resolver::resolve_plain(&value).to_string()
                    }
                    None => tags::STR.to_string(),
                };
                let start = pos(mark);
                let end = Pos {
                    index: start.index + value.len(),
                    line: start.line,
                    col: start.col + value.chars().count(),
                };
                let node = Node::new(tag, NodeKind::Scalar(value), Span { start, end });
                self.finish(node, anchor);
            }
            Event::SequenceStart(anchor, tag) => {
                self.stack.push(Open::Sequence {
                    tag: tag
                        .as_ref()
                        .map_or_else(|| tags::SEQ.to_string(), explicit_tag),
                    start: pos(mark),
                    anchor,
                    items: Vec::new(),
                });
            }
            Event::SequenceEnd => match self.stack.pop() {
                Some(Open::Sequence {
                    tag,
                    start,
                    anchor,
                    items,
                }) => {
                    let span = Span {
                        start,
                        end: pos(mark),
                    };
                    self.finish(Node::new(tag, NodeKind::Sequence(items), span), anchor);
                }
                _ => self.fail(MapError::internal(
                    "sequence end without a matching start",
                    point(mark),
                )),
            },
            Event::MappingStart(anchor, tag) => {
                self.stack.push(Open::Mapping {
                    tag: tag
                        .as_ref()
                        .map_or_else(|| tags::MAP.to_string(), explicit_tag),
                    start: pos(mark),
                    anchor,
                    pending: None,
                    pairs: Vec::new(),
                });
            }
            Event::MappingEnd => match self.stack.pop() {
                Some(Open::Mapping {
                    tag,
                    start,
                    anchor,
                    pending: None,
                    pairs,
                }) => {
                    let span = Span {
                        start,
                        end: pos(mark),
                    };
                    self.finish(Node::new(tag, NodeKind::Mapping(pairs), span), anchor);
                }
                _ => self.fail(MapError::internal(
                    "mapping end without a matching start",
                    point(mark),
                )),
            },
            Event::Alias(id) => match self.anchors.get(&id) {
                Some(node) => {
                    let copy = node.clone();
                    self.finish(copy, 0);
                }
                None => self.fail(MapError::unknown_alias(point(mark))),
            },
            _ => {}
        }
    }
}
