//! Synthetic one-child branch wrapping a matched mapping entry.
//!
//! Produced transiently by [`Mapping::match_children`](super::Mapping) for
//! every matched key, so the generic evaluator can treat "resolve this key's
//! value, then pair it with its key" exactly like any other branch. Never
//! part of a user-built schema.

use std::fmt;
use std::sync::Arc;

use super::hooks::PairFn;
use super::Schema;
use crate::document::Node;
use crate::errors::MapError;
use crate::value::Value;

#[derive(Clone)]
pub struct Expand {
    key: String,
    value: Arc<Schema>,
    pair: PairFn,
}

impl Expand {
    pub(crate) fn new(key: String, value: Schema, pair: PairFn) -> Self {
        Self {
            key,
            value: Arc::new(value),
            pair,
        }
    }

    pub(crate) fn matches(&self, node: &Node) -> Option<Schema> {
        self.value.matches(node)
    }

    pub(crate) fn match_children<'a>(
        &self,
        node: &'a Node,
    ) -> Result<Vec<(&'a Node, Schema)>, MapError> {
        match self.value.matches(node) {
            Some(schema) => Ok(vec![(node, schema)]),
            None => Err(MapError::no_matching_type(node)),
        }
    }

    pub(crate) fn resolve(&self, children: Vec<Value>, node: &Node) -> Result<Value, MapError> {
        match <[Value; 1]>::try_from(children) {
            Ok([value]) => Ok((self.pair)(self.key.clone(), value)),
            Err(children) => Err(MapError::internal(
                format!("entry expansion expected one child, got {}", children.len()),
                node.span(),
            )),
        }
    }
}

impl fmt::Debug for Expand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expand")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}
