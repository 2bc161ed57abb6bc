//! Branch schema for sequence nodes.

use std::fmt;
use std::sync::Arc;

use super::hooks::FactoryFn;
use super::{OneOf, Schema, TagSet};
use crate::document::{tags, Node};
use crate::errors::{MapError, SchemaError};
use crate::value::Value;

/// A branch schema for sequence nodes: every item must match one of the
/// "can contain" candidates, tried in declaration order.
#[derive(Clone)]
pub struct Sequence {
    tags: TagSet,
    inner: OneOf,
    output: Output,
}

#[derive(Clone)]
enum Output {
    List,
    Factory(FactoryFn),
}

impl Sequence {
    pub fn new() -> Self {
        Self {
            tags: TagSet::exact(&[tags::SEQ]),
            inner: OneOf::new(),
            output: Output::List,
        }
    }

    /// Accepts sequence nodes whose tag fully matches one of the given
    /// patterns instead of the standard `seq` tag.
    pub fn tagged(patterns: &[&str]) -> Result<Self, SchemaError> {
        Ok(Self {
            tags: TagSet::from_patterns(patterns)?,
            ..Self::new()
        })
    }

    /// Appends an item candidate, returning a new sequence schema.
    pub fn can_contain(mut self, schema: impl Into<Schema>) -> Self {
        self.inner = self.inner.case(schema);
        self
    }

    /// Spreads resolved items, in document order, into `factory` instead of
    /// collecting them into a list.
    pub fn build_with<F>(mut self, factory: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, MapError> + Send + Sync + 'static,
    {
        self.output = Output::Factory(Arc::new(factory));
        self
    }

    pub(crate) fn matches(&self, node: &Node) -> Option<Schema> {
        self.tags
            .matches(node.tag())
            .then(|| Schema::Sequence(self.clone()))
    }

    pub(crate) fn match_children<'a>(
        &self,
        node: &'a Node,
    ) -> Result<Vec<(&'a Node, Schema)>, MapError> {
        let Some(items) = node.items() else {
            return Err(MapError::internal(
                "sequence schema matched a non-sequence node",
                node.span(),
            ));
        };
        items
            .iter()
            .map(|item| {
                let matched = self
                    .inner
                    .matches(item)
                    .ok_or_else(|| MapError::no_matching_type(item))?;
                Ok((item, matched))
            })
            .collect()
    }

    pub(crate) fn resolve(&self, children: Vec<Value>, node: &Node) -> Result<Value, MapError> {
        match &self.output {
            Output::List => Ok(Value::List(children)),
            Output::Factory(factory) => factory(children).map_err(|e| e.or_span(node.span())),
        }
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("can_contain", &self.inner)
            .field(
                "output",
                &match &self.output {
                    Output::List => "list",
                    Output::Factory(_) => "build_with",
                },
            )
            .finish_non_exhaustive()
    }
}
