//! Identifier rules for child and action names.
//!
//! Every child addition registers a generated setter (`x` -> `setX`), so
//! child names and action names share one identifier grammar.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::{NodeError, NodeResult};

/// Prefix of generated setter actions.
pub const SETTER_PREFIX: &str = "set";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern compiles")
    })
}

/// Returns true if `name` is a bare identifier.
pub fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

/// Check `name` against the identifier grammar.
pub fn ensure_identifier(owner: &str, name: &str) -> NodeResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(NodeError::invalid_name(owner, name))
    }
}

/// Upper-case the first character of `name`.
pub fn cap_first(name: &str) -> NodeResult<String> {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => Ok(first.to_uppercase().chain(chars).collect()),
        None => Err(NodeError::invalid_name("cap_first", name)),
    }
}

/// `prefix` followed by `name` with its first character capitalized.
pub fn prefixed(prefix: &str, name: &str) -> NodeResult<String> {
    Ok(format!("{}{}", prefix, cap_first(name)?))
}

/// Name of the setter generated for a child called `name`.
pub fn setter_name(name: &str) -> NodeResult<String> {
    prefixed(SETTER_PREFIX, name)
}
