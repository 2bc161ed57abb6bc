//! Branch schema for mapping nodes: ordered entry rules with cardinality.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::expand::Expand;
use super::hooks::{default_pair, FactoryFn, KeyedFactoryFn, PairFn};
use super::{anchored, Schema, TagSet};
use crate::document::{tags, Node};
use crate::errors::{MapError, SchemaError};
use crate::value::Value;

/// One (key-pattern, value-schema, pair-constructor) case of an entry rule.
#[derive(Clone)]
struct EntryCase {
    raw: String,
    pattern: Regex,
    schema: Arc<Schema>,
    pair: PairFn,
}

/// An entry rule: cardinality flags plus one or more cases.
///
/// The builder conveniences on [`Mapping`] register single-case rules; build
/// an `Entry` directly to give one rule several key patterns or a custom
/// pair constructor.
#[derive(Clone)]
pub struct Entry {
    required: bool,
    repeat: bool,
    cases: im::Vector<EntryCase>,
}

impl Entry {
    pub fn new(required: bool, repeat: bool) -> Self {
        Self {
            required,
            repeat,
            cases: im::Vector::new(),
        }
    }

    /// Adds a case with the default pair constructor.
    pub fn case(self, pattern: &str, schema: impl Into<Schema>) -> Result<Self, SchemaError> {
        self.push_case(pattern, schema.into(), default_pair())
    }

    /// Adds a case with a custom pair constructor.
    pub fn case_with<F>(
        self,
        pattern: &str,
        schema: impl Into<Schema>,
        pair: F,
    ) -> Result<Self, SchemaError>
    where
        F: Fn(String, Value) -> Value + Send + Sync + 'static,
    {
        self.push_case(pattern, schema.into(), Arc::new(pair))
    }

    fn push_case(mut self, pattern: &str, schema: Schema, pair: PairFn) -> Result<Self, SchemaError> {
        self.cases.push_back(EntryCase {
            raw: pattern.to_string(),
            pattern: anchored(pattern)?,
            schema: Arc::new(schema),
            pair,
        });
        Ok(self)
    }

    /// First case whose key pattern fully matches `key` *and* whose value
    /// schema accepts `value`. A pattern hit with a value miss falls through
    /// to the next case.
    fn match_item(&self, key: &str, value: &Node) -> Option<(Schema, PairFn)> {
        for case in &self.cases {
            if !case.pattern.is_match(key) {
                continue;
            }
            if let Some(matched) = case.schema.matches(value) {
                return Some((matched, case.pair.clone()));
            }
        }
        None
    }

    /// Pattern set for diagnostics, e.g. `(command | cmd)`.
    fn keys_repr(&self) -> String {
        let patterns: Vec<&str> = self.cases.iter().map(|case| case.raw.as_str()).collect();
        format!("({})", patterns.join(" | "))
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("required", &self.required)
            .field("repeat", &self.repeat)
            .field("keys", &self.keys_repr())
            .finish()
    }
}

/// How a mapping assembles its resolved pair children.
#[derive(Clone)]
enum Output {
    /// Ordered key→value container, duplicates retained.
    Entries,
    /// Exactly one entry; the output is that entry's value alone.
    Squash,
    /// Pairs spread as named arguments into a factory.
    Keyed(KeyedFactoryFn),
    /// Raw ordered children handed to a factory.
    Factory(FactoryFn),
}

impl Output {
    const fn name(&self) -> &'static str {
        match self {
            Output::Entries => "entries",
            Output::Squash => "squash",
            Output::Keyed(_) => "unpack_into",
            Output::Factory(_) => "build_with",
        }
    }
}

/// A branch schema for mapping nodes.
///
/// Holds an ordered list of entry rules. While matching children, every
/// (key, value) pair in the document is scanned against the rules in
/// declaration order; after all pairs are placed, occurrence counts are
/// checked against each rule's cardinality. Both checks happen before any
/// child resolves, so a cardinality error always reflects the full mapping.
#[derive(Clone)]
pub struct Mapping {
    tags: TagSet,
    entries: im::Vector<Entry>,
    output: Output,
}

impl Mapping {
    pub fn new() -> Self {
        Self {
            tags: TagSet::exact(&[tags::MAP]),
            entries: im::Vector::new(),
            output: Output::Entries,
        }
    }

    /// Accepts mapping nodes whose tag fully matches one of the given
    /// patterns instead of the standard `map` tag.
    pub fn tagged(patterns: &[&str]) -> Result<Self, SchemaError> {
        Ok(Self {
            tags: TagSet::from_patterns(patterns)?,
            ..Self::new()
        })
    }

    /// Attaches a hand-built entry rule.
    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push_back(entry);
        self
    }

    fn rule(
        self,
        pattern: &str,
        schema: impl Into<Schema>,
        required: bool,
        repeat: bool,
    ) -> Result<Self, SchemaError> {
        Ok(self.entry(Entry::new(required, repeat).case(pattern, schema)?))
    }

    /// Registers a key that may appear at most once.
    pub fn optional(self, pattern: &str, schema: impl Into<Schema>) -> Result<Self, SchemaError> {
        self.rule(pattern, schema, false, false)
    }

    /// Alias for [`Mapping::optional`].
    pub fn zero_or_one(self, pattern: &str, schema: impl Into<Schema>) -> Result<Self, SchemaError> {
        self.optional(pattern, schema)
    }

    /// Registers a key that must appear exactly once.
    pub fn required(self, pattern: &str, schema: impl Into<Schema>) -> Result<Self, SchemaError> {
        self.rule(pattern, schema, true, false)
    }

    /// Alias for [`Mapping::required`].
    pub fn exactly_one(self, pattern: &str, schema: impl Into<Schema>) -> Result<Self, SchemaError> {
        self.required(pattern, schema)
    }

    /// Registers a key that may appear any number of times.
    pub fn zero_or_more(self, pattern: &str, schema: impl Into<Schema>) -> Result<Self, SchemaError> {
        self.rule(pattern, schema, false, true)
    }

    /// Registers a key that must appear at least once.
    pub fn one_or_more(self, pattern: &str, schema: impl Into<Schema>) -> Result<Self, SchemaError> {
        self.rule(pattern, schema, true, true)
    }

    /// Collapses the mapping to its single entry's value. The document must
    /// produce exactly one entry or resolution fails.
    pub fn squash(self) -> Result<Self, SchemaError> {
        self.set_output(Output::Squash)
    }

    /// Spreads resolved (key, value) pairs as named arguments into `factory`.
    pub fn unpack_into<F>(self, factory: F) -> Result<Self, SchemaError>
    where
        F: Fn(Vec<(String, Value)>) -> Result<Value, MapError> + Send + Sync + 'static,
    {
        self.set_output(Output::Keyed(Arc::new(factory)))
    }

    /// Hands the raw ordered children to `factory`.
    pub fn build_with<F>(self, factory: F) -> Result<Self, SchemaError>
    where
        F: Fn(Vec<Value>) -> Result<Value, MapError> + Send + Sync + 'static,
    {
        self.set_output(Output::Factory(Arc::new(factory)))
    }

    fn set_output(mut self, output: Output) -> Result<Self, SchemaError> {
        if !matches!(self.output, Output::Entries) {
            return Err(SchemaError::ConflictingTransforms {
                declared: self.output.name(),
                rejected: output.name(),
            });
        }
        self.output = output;
        Ok(self)
    }

    pub(crate) fn matches(&self, node: &Node) -> Option<Schema> {
        self.tags
            .matches(node.tag())
            .then(|| Schema::Mapping(self.clone()))
    }

    pub(crate) fn match_children<'a>(
        &self,
        node: &'a Node,
    ) -> Result<Vec<(&'a Node, Schema)>, MapError> {
        let Some(pairs) = node.pairs() else {
            return Err(MapError::internal(
                "mapping schema matched a non-mapping node",
                node.span(),
            ));
        };

        let mut counts = vec![0usize; self.entries.len()];
        let mut children = Vec::with_capacity(pairs.len());

        for (key_node, value_node) in pairs {
            let key = match key_node.scalar_text() {
                Some(text) if key_node.tag() == tags::STR => text,
                _ => return Err(MapError::non_string_key(key_node)),
            };

            let hit = self.entries.iter().enumerate().find_map(|(index, entry)| {
                entry
                    .match_item(key, value_node)
                    .map(|(schema, pair)| (index, schema, pair))
            });
            let Some((index, schema, pair)) = hit else {
                return Err(MapError::no_matching_type(key_node));
            };

            counts[index] += 1;
            children.push((
                value_node,
                Schema::Expand(Expand::new(key.to_string(), schema, pair)),
            ));
        }

        // Cardinality is validated only once the whole mapping has been
        // scanned, so the error reflects every occurrence.
        for (entry, count) in self.entries.iter().zip(counts) {
            if entry.required && count == 0 {
                return Err(MapError::required_key_missing(entry.keys_repr(), node));
            }
            if !entry.repeat && count > 1 {
                return Err(MapError::too_many_occurrences(entry.keys_repr(), node));
            }
        }

        Ok(children)
    }

    pub(crate) fn resolve(&self, children: Vec<Value>, node: &Node) -> Result<Value, MapError> {
        match &self.output {
            Output::Entries => Ok(Value::Map(into_pairs(children, node)?)),
            Output::Squash => match <[Value; 1]>::try_from(children) {
                Ok([child]) => Ok(match child {
                    Value::Pair(pair) => (*pair).1,
                    other => other,
                }),
                Err(children) => Err(MapError::not_singleton(children.len(), node)),
            },
            Output::Keyed(factory) => {
                factory(into_pairs(children, node)?).map_err(|e| e.or_span(node.span()))
            }
            Output::Factory(factory) => factory(children).map_err(|e| e.or_span(node.span())),
        }
    }
}

fn into_pairs(children: Vec<Value>, node: &Node) -> Result<Vec<(String, Value)>, MapError> {
    children
        .into_iter()
        .map(|child| match child {
            Value::Pair(pair) => Ok(*pair),
            other => Err(MapError::internal(
                format!(
                    "mapping output requires pair children, got {}",
                    other.type_name()
                ),
                node.span(),
            )),
        })
        .collect()
}

impl Default for Mapping {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("entries", &self.entries.iter().collect::<Vec<_>>())
            .field("output", &self.output.name())
            .finish_non_exhaustive()
    }
}
