//! Error types for schema construction and document mapping.
//!
//! Two failure surfaces, kept strictly apart:
//!
//! - [`SchemaError`] is raised while *building* a schema (invalid pattern
//!   text, conflicting output transforms). It is a programming error in the
//!   caller's grammar and never comes out of a `load`.
//! - [`MapError`] is raised while *mapping* a document. It carries a kind, a
//!   span into the document, and (once the entry point has attached it) the
//!   document text itself, so it renders as a labeled `miette` diagnostic.
//!
//! "No match" during alternation or entry scanning is *not* an error — it is
//! `None` from the matching probes, used internally to try the next
//! candidate. A `MapError` always means the whole `load` call is dead.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource};
use thiserror::Error;

use crate::document::{Node, Span};

/// Inconsistent builder usage, reported at schema construction time.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("conflicting output transforms: '{declared}' is already set, cannot also set '{rejected}'")]
    ConflictingTransforms {
        declared: &'static str,
        rejected: &'static str,
    },
}

/// Broad classification of a [`MapError`], mainly for test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The document does not have the shape the schema demands.
    Structure,
    /// The document itself is unusable (scan failure, no/too many roots).
    Document,
    /// Reading the input failed before parsing started.
    Io,
    /// An invariant of the mapper was violated; a bug, not a data error.
    Internal,
}

/// What went wrong while mapping a document against a schema.
#[derive(Debug)]
pub enum MapErrorKind {
    /// No candidate schema accepted the node.
    NoMatchingType,
    /// A mapping key node is not a plain string scalar.
    NonStringKey,
    /// A required entry rule matched no key; carries the rule's pattern set.
    RequiredKeyMissing { keys: String },
    /// A non-repeatable entry rule matched more than one key.
    TooManyOccurrences { keys: String },
    /// A squashed mapping resolved to other than exactly one entry.
    NotSingleton { count: usize },
    /// A scalar's text could not be converted for its tag.
    InvalidScalar { expected: String, text: String },
    /// Failure raised by a user-supplied constructor or factory hook.
    Custom { message: String },
    /// The stream held no document root.
    EmptyDocument,
    /// The stream held more than one document.
    MultipleDocuments,
    /// An alias referenced an anchor that was never completed.
    UnknownAlias,
    /// The underlying scanner rejected the text.
    Scan(yaml_rust2::scanner::ScanError),
    /// The input could not be read.
    Io(std::io::Error),
    Internal { message: String },
}

/// A structural mapping error with a position in the source document.
#[derive(Debug)]
pub struct MapError {
    kind: MapErrorKind,
    span: Option<Span>,
    source_code: Option<Arc<NamedSource<String>>>,
}

impl MapError {
    fn new(kind: MapErrorKind, span: Option<Span>) -> Self {
        Self {
            kind,
            span,
            source_code: None,
        }
    }

    pub(crate) fn no_matching_type(node: &Node) -> Self {
        Self::new(MapErrorKind::NoMatchingType, Some(node.span()))
    }

    pub(crate) fn non_string_key(node: &Node) -> Self {
        Self::new(MapErrorKind::NonStringKey, Some(node.span()))
    }

    pub(crate) fn required_key_missing(keys: String, node: &Node) -> Self {
        Self::new(MapErrorKind::RequiredKeyMissing { keys }, Some(node.span()))
    }

    pub(crate) fn too_many_occurrences(keys: String, node: &Node) -> Self {
        Self::new(MapErrorKind::TooManyOccurrences { keys }, Some(node.span()))
    }

    pub(crate) fn not_singleton(count: usize, node: &Node) -> Self {
        Self::new(MapErrorKind::NotSingleton { count }, Some(node.span()))
    }

    pub(crate) fn invalid_scalar(expected: &str, text: &str, span: Span) -> Self {
        Self::new(
            MapErrorKind::InvalidScalar {
                expected: expected.to_string(),
                text: text.to_string(),
            },
            Some(span),
        )
    }

    /// For user-supplied hooks: a mapping failure with a free-form message.
    /// The mapper fills in the span of the node being resolved.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(
            MapErrorKind::Custom {
                message: message.into(),
            },
            None,
        )
    }

    pub(crate) fn empty_document() -> Self {
        Self::new(MapErrorKind::EmptyDocument, None)
    }

    pub(crate) fn multiple_documents() -> Self {
        Self::new(MapErrorKind::MultipleDocuments, None)
    }

    pub(crate) fn unknown_alias(span: Span) -> Self {
        Self::new(MapErrorKind::UnknownAlias, Some(span))
    }

    pub(crate) fn scan(error: yaml_rust2::scanner::ScanError) -> Self {
        Self::new(MapErrorKind::Scan(error), None)
    }

    pub(crate) fn io(error: std::io::Error) -> Self {
        Self::new(MapErrorKind::Io(error), None)
    }

    pub(crate) fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::new(
            MapErrorKind::Internal {
                message: message.into(),
            },
            Some(span),
        )
    }

    pub fn kind(&self) -> &MapErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn category(&self) -> ErrorCategory {
        match &self.kind {
            MapErrorKind::NoMatchingType
            | MapErrorKind::NonStringKey
            | MapErrorKind::RequiredKeyMissing { .. }
            | MapErrorKind::TooManyOccurrences { .. }
            | MapErrorKind::NotSingleton { .. }
            | MapErrorKind::InvalidScalar { .. }
            | MapErrorKind::Custom { .. } => ErrorCategory::Structure,
            MapErrorKind::EmptyDocument
            | MapErrorKind::MultipleDocuments
            | MapErrorKind::UnknownAlias
            | MapErrorKind::Scan(_) => ErrorCategory::Document,
            MapErrorKind::Io(_) => ErrorCategory::Io,
            MapErrorKind::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Fills in the span if the error was raised without one.
    pub(crate) fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Attaches the document text so diagnostics can render a labeled span.
    pub(crate) fn with_source(mut self, source: Arc<NamedSource<String>>) -> Self {
        if self.source_code.is_none() {
            self.source_code = Some(source);
        }
        self
    }

    fn code_suffix(&self) -> &'static str {
        match &self.kind {
            MapErrorKind::NoMatchingType => "no_matching_type",
            MapErrorKind::NonStringKey => "non_string_key",
            MapErrorKind::RequiredKeyMissing { .. } => "required_key_missing",
            MapErrorKind::TooManyOccurrences { .. } => "too_many_occurrences",
            MapErrorKind::NotSingleton { .. } => "not_singleton",
            MapErrorKind::InvalidScalar { .. } => "invalid_scalar",
            MapErrorKind::Custom { .. } => "custom",
            MapErrorKind::EmptyDocument => "empty_document",
            MapErrorKind::MultipleDocuments => "multiple_documents",
            MapErrorKind::UnknownAlias => "unknown_alias",
            MapErrorKind::Scan(_) => "scan",
            MapErrorKind::Io(_) => "io",
            MapErrorKind::Internal { .. } => "internal",
        }
    }

    fn message(&self) -> String {
        match &self.kind {
            MapErrorKind::NoMatchingType => "found no matching type".to_string(),
            MapErrorKind::NonStringKey => {
                "only plain strings are supported as mapping keys".to_string()
            }
            MapErrorKind::RequiredKeyMissing { keys } => {
                format!("required key {keys} missing")
            }
            MapErrorKind::TooManyOccurrences { keys } => {
                format!("maximum one of {keys} allowed")
            }
            MapErrorKind::NotSingleton { count } => {
                format!("expected exactly one entry, found {count}")
            }
            MapErrorKind::InvalidScalar { expected, text } => {
                format!("invalid {expected} scalar '{text}'")
            }
            MapErrorKind::Custom { message } => message.clone(),
            MapErrorKind::EmptyDocument => "document contains no root node".to_string(),
            MapErrorKind::MultipleDocuments => "expected a single document".to_string(),
            MapErrorKind::UnknownAlias => "alias refers to no known anchor".to_string(),
            MapErrorKind::Scan(error) => format!("invalid document: {error}"),
            MapErrorKind::Io(error) => format!("failed to read document: {error}"),
            MapErrorKind::Internal { message } => format!("internal error: {message}"),
        }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())?;
        if let Some(span) = self.span {
            write!(f, " at {}", span.start)?;
        }
        Ok(())
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            MapErrorKind::Scan(error) => Some(error),
            MapErrorKind::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl Diagnostic for MapError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("schemap::{}", self.code_suffix())))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_code
            .as_ref()
            .map(|source| source.as_ref() as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        let label = LabeledSpan::new_with_span(Some(self.message()), span.to_source_span());
        Some(Box::new(std::iter::once(label)))
    }
}
