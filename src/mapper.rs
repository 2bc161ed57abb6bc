//! The iterative mapper: walks one document against one schema.
//!
//! The traversal is a state machine over an explicit frame stack rather than
//! native recursion, so the depth it can handle is bounded by memory for the
//! stack, not by the call stack. Each leaf node is visited once; each branch
//! node twice. The first visit of a branch matches all of its children to
//! schemas (validating cardinality in the same step) and pushes a frame per
//! child; the second visit — once every child frame above it has resolved —
//! assembles the accumulated child values into the branch's output.
//!
//! Child frames refer to their parent by index into the frame vector. A
//! parent is always deeper in the vector than its children, so the index
//! stays valid until the parent itself resolves and is popped.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use miette::NamedSource;

use crate::document::{compose, Node};
use crate::errors::MapError;
use crate::schema::Schema;
use crate::value::Value;

/// Maps a YAML string against `schema`.
pub fn load_str(schema: impl Into<Schema>, source: &str) -> Result<Value, MapError> {
    load_named(&schema.into(), "document", source)
}

/// Reads `reader` to its end and maps the text against `schema`.
pub fn load_reader(schema: impl Into<Schema>, mut reader: impl io::Read) -> Result<Value, MapError> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(MapError::io)?;
    load_named(&schema.into(), "stream", &text)
}

/// Reads the file at `path` and maps it against `schema`.
pub fn load_path(schema: impl Into<Schema>, path: impl AsRef<Path>) -> Result<Value, MapError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(MapError::io)?;
    load_named(&schema.into(), &path.display().to_string(), &text)
}

fn load_named(schema: &Schema, name: &str, text: &str) -> Result<Value, MapError> {
    evaluate(schema, text).map_err(|error| {
        error.with_source(Arc::new(NamedSource::new(name, text.to_string())))
    })
}

struct Frame<'a> {
    node: &'a Node,
    schema: Schema,
    parent: Option<usize>,
    visited: bool,
    children: Vec<Value>,
}

impl<'a> Frame<'a> {
    fn new(node: &'a Node, schema: Schema, parent: Option<usize>) -> Self {
        Self {
            node,
            schema,
            parent,
            visited: false,
            children: Vec::new(),
        }
    }
}

fn evaluate(schema: &Schema, text: &str) -> Result<Value, MapError> {
    let document = compose(text)?;
    let root = document.root().ok_or_else(MapError::empty_document)?;
    let matched = schema
        .matches(root)
        .ok_or_else(|| MapError::no_matching_type(root))?;

    let mut stack = vec![Frame::new(root, matched, None)];

    loop {
        let top = stack.len() - 1;

        if !stack[top].visited {
            let schema = stack[top].schema.clone();
            let node = stack[top].node;
            if let Some(children) = schema.match_children(node)? {
                stack[top].visited = true;
                // Reversed, so the first child in document order sits on top
                // of the stack and parents accumulate values in document
                // order.
                for (child_node, child_schema) in children.into_iter().rev() {
                    stack.push(Frame::new(child_node, child_schema, Some(top)));
                }
                continue;
            }
        }

        let frame = stack.pop().expect("frame stack is non-empty inside loop");
        let value = if frame.visited {
            frame.schema.resolve_branch(frame.children, frame.node)?
        } else {
            frame.schema.resolve_leaf(frame.node)?
        };

        match frame.parent {
            Some(parent) => stack[parent].children.push(value),
            None => return Ok(value),
        }
    }
}
