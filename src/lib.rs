//! Schema-driven YAML to value mapping.
//!
//! Declare what shapes of document are acceptable as a composable grammar of
//! immutable schema values, then walk an actual document against it:
//! [`load_str`] either returns a typed [`Value`] or a [`MapError`] pointing
//! at the offending node.
//!
//! ```rust
//! use schemap::{load_str, Mapping, Scalar, Sequence};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Mapping::new()
//!     .required("command", Scalar::string())?
//!     .optional("arguments", Sequence::new().can_contain(Scalar::string()))?;
//!
//! let value = load_str(schema, "command: /bin/echo\narguments: [hello]")?;
//! assert_eq!(value.get("command").and_then(|v| v.as_str()), Some("/bin/echo"));
//! # Ok(())
//! # }
//! ```
//!
//! Schemas are persistent values: every builder call returns a new schema
//! and never mutates the receiver, so partial grammars can be reused and
//! finished grammars shared freely across threads.

pub mod document;
pub mod errors;
pub mod mapper;
pub mod schema;
pub mod value;

pub use errors::{ErrorCategory, MapError, MapErrorKind, SchemaError};
pub use mapper::{load_path, load_reader, load_str};
pub use schema::{Entry, Mapping, OneOf, Scalar, Schema, Sequence};
pub use value::Value;
