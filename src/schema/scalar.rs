//! Leaf schemas for scalar nodes.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::hooks::{construct_scalar, ConstructFn, TransformFn};
use super::{anchored, Schema, TagSet};
use crate::document::{tags, Node};
use crate::errors::{MapError, SchemaError};
use crate::value::Value;

/// A leaf schema: matches scalar nodes by tag (and optionally by text),
/// then constructs a value from the node's payload.
#[derive(Clone)]
pub struct Scalar {
    tags: TagSet,
    pattern: Option<Regex>,
    construct: ConstructFn,
    transform: Option<TransformFn>,
}

impl Scalar {
    fn with_tags(tags: TagSet) -> Self {
        Self {
            tags,
            pattern: None,
            construct: Arc::new(construct_scalar),
            transform: None,
        }
    }

    /// Accepts any core-schema scalar: str, int, float, bool or null.
    pub fn any() -> Self {
        Self::with_tags(TagSet::exact(&[
            tags::STR,
            tags::INT,
            tags::FLOAT,
            tags::BOOL,
            tags::NULL,
        ]))
    }

    pub fn string() -> Self {
        Self::with_tags(TagSet::exact(&[tags::STR]))
    }

    pub fn integer() -> Self {
        Self::with_tags(TagSet::exact(&[tags::INT]))
    }

    pub fn float() -> Self {
        Self::with_tags(TagSet::exact(&[tags::FLOAT]))
    }

    /// Accepts int or float.
    pub fn number() -> Self {
        Self::with_tags(TagSet::exact(&[tags::INT, tags::FLOAT]))
    }

    pub fn boolean() -> Self {
        Self::with_tags(TagSet::exact(&[tags::BOOL]))
    }

    pub fn null() -> Self {
        Self::with_tags(TagSet::exact(&[tags::NULL]))
    }

    /// Accepts nodes whose tag fully matches one of the given patterns.
    pub fn tagged(patterns: &[&str]) -> Result<Self, SchemaError> {
        Ok(Self::with_tags(TagSet::from_patterns(patterns)?))
    }

    /// Additionally requires the raw scalar text to fully match `pattern`.
    pub fn matching(mut self, pattern: &str) -> Result<Self, SchemaError> {
        self.pattern = Some(anchored(pattern)?);
        Ok(self)
    }

    /// Replaces the default constructor with a custom hook.
    pub fn construct_with<F>(mut self, construct: F) -> Self
    where
        F: Fn(&Node) -> Result<Value, MapError> + Send + Sync + 'static,
    {
        self.construct = Arc::new(construct);
        self
    }

    /// Runs the constructed value through a conversion.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Result<Value, MapError> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub(crate) fn matches(&self, node: &Node) -> Option<Schema> {
        if !self.tags.matches(node.tag()) {
            return None;
        }
        if let Some(pattern) = &self.pattern {
            match node.scalar_text() {
                Some(text) if pattern.is_match(text) => {}
                _ => return None,
            }
        }
        Some(Schema::Scalar(self.clone()))
    }

    pub(crate) fn resolve(&self, node: &Node) -> Result<Value, MapError> {
        let value = (self.construct)(node).map_err(|e| e.or_span(node.span()))?;
        match &self.transform {
            Some(transform) => transform(value).map_err(|e| e.or_span(node.span())),
            None => Ok(value),
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scalar")
            .field("tags", &self.tags)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("transform", &self.transform.is_some())
            .finish_non_exhaustive()
    }
}
