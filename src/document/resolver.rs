//! Implicit tag resolution for plain scalars, YAML 1.2 core schema.

use once_cell::sync::Lazy;
use regex::Regex;

use super::tags;

static NULL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A(?:~|null|Null|NULL|)\z").expect("null pattern"));

static BOOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A(?:true|True|TRUE|false|False|FALSE)\z").expect("bool pattern"));

static INT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A(?:[-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+)\z").expect("int pattern"));

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\A(?:[-+]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][-+]?[0-9]+)?|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))\z",
    )
    .expect("float pattern")
});

/// Resolves the tag of an untagged plain scalar. Quoted and block scalars
/// never reach this; they are always `str`.
pub(crate) fn resolve_plain(text: &str) -> &'static str {
    if NULL_RE.is_match(text) {
        tags::NULL
    } else if BOOL_RE.is_match(text) {
        tags::BOOL
    } else if INT_RE.is_match(text) {
        tags::INT
    } else if FLOAT_RE.is_match(text) {
        tags::FLOAT
    } else {
        tags::STR
    }
}
