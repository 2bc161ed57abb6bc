//! The schema hierarchy: immutable matcher/resolver values.
//!
//! Every schema is a persistent value. Builder methods consume `self` and
//! return a new schema; unchanged substructure is shared (`im::Vector` for
//! candidate and entry lists, `Arc` for nested schemas and hooks), so
//! "modifying" a schema never disturbs a value someone else still holds, and
//! a finished schema can be shared across threads and concurrent loads.
//!
//! Two shapes exist. *Leaves* ([`Scalar`]) produce a value directly from a
//! node. *Branches* ([`Mapping`], [`Sequence`], and the internal per-key
//! [`Expand`]) produce child (node, schema) pairs for the mapper to walk.
//! [`OneOf`] is neither: it only routes matching to its first accepting
//! candidate. Matching is a recoverable probe — `None` means "try the next
//! candidate", and only the caller decides when running out of candidates is
//! a structural error.

mod expand;
mod hooks;
mod mapping;
mod oneof;
mod scalar;
mod sequence;

pub use expand::Expand;
pub use hooks::{
    construct_scalar, ConstructFn, FactoryFn, KeyedFactoryFn, PairFn, TransformFn,
};
pub use mapping::{Entry, Mapping};
pub use oneof::OneOf;
pub use scalar::Scalar;
pub use sequence::Sequence;

use std::fmt;
use std::io;
use std::path::Path;

use regex::Regex;

use crate::document::Node;
use crate::errors::{MapError, SchemaError};
use crate::value::Value;

/// Any schema, ready to be matched against a node.
#[derive(Debug, Clone)]
pub enum Schema {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Sequence),
    OneOf(OneOf),
    /// Internal per-key expansion produced while matching mapping children.
    Expand(Expand),
}

impl Schema {
    /// Probes whether this schema accepts `node`, returning the concrete
    /// schema that will resolve it. `None` is a recoverable no-match.
    pub fn matches(&self, node: &Node) -> Option<Schema> {
        match self {
            Schema::Scalar(scalar) => scalar.matches(node),
            Schema::Mapping(mapping) => mapping.matches(node),
            Schema::Sequence(sequence) => sequence.matches(node),
            Schema::OneOf(oneof) => oneof.matches(node),
            Schema::Expand(expand) => expand.matches(node),
        }
    }

    /// Children to walk for a branch node, `None` for a leaf. For branches
    /// this also enforces all cardinality invariants and fails atomically:
    /// either the full child list is returned or nothing is.
    pub(crate) fn match_children<'a>(
        &self,
        node: &'a Node,
    ) -> Result<Option<Vec<(&'a Node, Schema)>>, MapError> {
        match self {
            Schema::Scalar(_) => Ok(None),
            Schema::Mapping(mapping) => mapping.match_children(node).map(Some),
            Schema::Sequence(sequence) => sequence.match_children(node).map(Some),
            Schema::Expand(expand) => expand.match_children(node).map(Some),
            Schema::OneOf(_) => {
                unreachable!("alternation must be resolved to a concrete schema before traversal")
            }
        }
    }

    pub(crate) fn resolve_leaf(&self, node: &Node) -> Result<Value, MapError> {
        match self {
            Schema::Scalar(scalar) => scalar.resolve(node),
            _ => unreachable!("leaf resolution invoked on a branch schema"),
        }
    }

    pub(crate) fn resolve_branch(
        &self,
        children: Vec<Value>,
        node: &Node,
    ) -> Result<Value, MapError> {
        match self {
            Schema::Mapping(mapping) => mapping.resolve(children, node),
            Schema::Sequence(sequence) => sequence.resolve(children, node),
            Schema::Expand(expand) => expand.resolve(children, node),
            _ => unreachable!("branch resolution invoked on a leaf schema"),
        }
    }

    /// Maps a YAML string against this schema.
    pub fn load_str(&self, source: &str) -> Result<Value, MapError> {
        crate::mapper::load_str(self.clone(), source)
    }

    /// Reads a stream to its end and maps it against this schema.
    pub fn load_reader(&self, reader: impl io::Read) -> Result<Value, MapError> {
        crate::mapper::load_reader(self.clone(), reader)
    }

    /// Reads a file and maps it against this schema.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Value, MapError> {
        crate::mapper::load_path(self.clone(), path)
    }
}

impl From<Scalar> for Schema {
    fn from(scalar: Scalar) -> Self {
        Schema::Scalar(scalar)
    }
}

impl From<Mapping> for Schema {
    fn from(mapping: Mapping) -> Self {
        Schema::Mapping(mapping)
    }
}

impl From<Sequence> for Schema {
    fn from(sequence: Sequence) -> Self {
        Schema::Sequence(sequence)
    }
}

impl From<OneOf> for Schema {
    fn from(oneof: OneOf) -> Self {
        Schema::OneOf(oneof)
    }
}

/// Compiles a pattern anchored at both ends; a prefix match is not a match.
pub(crate) fn anchored(pattern: &str) -> Result<Regex, SchemaError> {
    Regex::new(&format!(r"\A(?:{pattern})\z")).map_err(|source| SchemaError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// One or more anchored patterns over a node's type tag.
#[derive(Clone)]
pub(crate) struct TagSet {
    patterns: im::Vector<Regex>,
}

impl TagSet {
    /// Exact tags, escaped; cannot fail.
    pub(crate) fn exact(tags: &[&str]) -> Self {
        let mut patterns = im::Vector::new();
        for tag in tags {
            let pattern = format!(r"\A{}\z", regex::escape(tag));
            patterns.push_back(Regex::new(&pattern).expect("escaped tag is a valid pattern"));
        }
        Self { patterns }
    }

    pub(crate) fn from_patterns(specs: &[&str]) -> Result<Self, SchemaError> {
        let mut patterns = im::Vector::new();
        for spec in specs {
            patterns.push_back(anchored(spec)?);
        }
        Ok(Self { patterns })
    }

    pub(crate) fn matches(&self, tag: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(tag))
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.patterns.iter().map(Regex::as_str))
            .finish()
    }
}
