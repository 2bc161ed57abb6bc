//! Function-object hooks plugged into schemas.
//!
//! Target types vary per caller, so every pluggable behavior is a value with
//! a single call operation: constructing a leaf value from a node, running a
//! resolved value through a transform, pairing a mapping key with its
//! resolved value, and assembling branch children into an output.

use std::sync::Arc;

use crate::document::{tags, Node};
use crate::errors::MapError;
use crate::value::Value;

/// Turns a leaf node into a raw value.
pub type ConstructFn = Arc<dyn Fn(&Node) -> Result<Value, MapError> + Send + Sync>;

/// Runs a freshly constructed or resolved value through a conversion.
pub type TransformFn = Arc<dyn Fn(Value) -> Result<Value, MapError> + Send + Sync>;

/// Combines a matched mapping key with its resolved value.
pub type PairFn = Arc<dyn Fn(String, Value) -> Value + Send + Sync>;

/// Assembles resolved children, in document order, into an output value.
pub type FactoryFn = Arc<dyn Fn(Vec<Value>) -> Result<Value, MapError> + Send + Sync>;

/// Assembles resolved (key, value) pairs, in document order, into an output
/// value; the unpack-as-named-arguments transform.
pub type KeyedFactoryFn =
    Arc<dyn Fn(Vec<(String, Value)>) -> Result<Value, MapError> + Send + Sync>;

pub(crate) fn default_pair() -> PairFn {
    Arc::new(|key, value| Value::pair(key, value))
}

/// The default leaf constructor: parses the scalar text according to its
/// resolved tag. Anything that is not null, bool, int or float comes out as
/// a string, including explicitly `!!str`-tagged numbers.
pub fn construct_scalar(node: &Node) -> Result<Value, MapError> {
    let Some(text) = node.scalar_text() else {
        return Err(MapError::internal(
            "scalar constructor invoked on a collection node",
            node.span(),
        ));
    };
    match node.tag() {
        tags::NULL => Ok(Value::Null),
        tags::BOOL => parse_bool(text, node),
        tags::INT => parse_int(text, node),
        tags::FLOAT => parse_float(text, node),
        _ => Ok(Value::String(text.to_string())),
    }
}

fn parse_bool(text: &str, node: &Node) -> Result<Value, MapError> {
    match text {
        "true" | "True" | "TRUE" => Ok(Value::Bool(true)),
        "false" | "False" | "FALSE" => Ok(Value::Bool(false)),
        _ => Err(MapError::invalid_scalar("bool", text, node.span())),
    }
}

fn parse_int(text: &str, node: &Node) -> Result<Value, MapError> {
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'+') => (1, &text[1..]),
        Some(b'-') => (-1, &text[1..]),
        _ => (1, text),
    };
    let parsed = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(octal) = digits.strip_prefix("0o") {
        i64::from_str_radix(octal, 8)
    } else {
        digits.parse::<i64>()
    };
    match parsed {
        Ok(n) => Ok(Value::Int(sign * n)),
        Err(_) => Err(MapError::invalid_scalar("int", text, node.span())),
    }
}

fn parse_float(text: &str, node: &Node) -> Result<Value, MapError> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Ok(Value::Float(f64::INFINITY)),
        "-.inf" | "-.Inf" | "-.INF" => Ok(Value::Float(f64::NEG_INFINITY)),
        ".nan" | ".NaN" | ".NAN" => Ok(Value::Float(f64::NAN)),
        _ => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| MapError::invalid_scalar("float", text, node.span())),
    }
}
