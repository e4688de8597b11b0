//! The Resolver - type declaration to validator lookup.

use crate::{Predicate, RegistryError, RegistryResult, TypeSpec, TypeTag, Validator};
use arbor_core::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Turns a `TypeSpec` into a `Validator` for a named field.
/// It is immutable after construction (use ResolverBuilder to add custom tags).
#[derive(Clone, Default)]
pub struct Resolver {
    /// Custom tags, consulted after the built-ins.
    custom: Rc<HashMap<String, Predicate>>,
    strict: bool,
}

impl Resolver {
    pub(crate) fn new(custom: HashMap<String, Predicate>, strict: bool) -> Self {
        Self {
            custom: Rc::new(custom),
            strict,
        }
    }

    /// Whether unknown tags are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether `tag` is built-in or registered.
    pub fn knows(&self, tag: &str) -> bool {
        TypeTag::parse(tag).is_some() || self.custom.contains_key(tag)
    }

    /// Resolve `spec` for `field`.
    ///
    /// Unknown tags resolve to a validator that always passes, unless the
    /// resolver is strict.
    pub fn resolve(&self, spec: &TypeSpec, field: &str) -> RegistryResult<Validator> {
        match spec {
            TypeSpec::Any => Ok(pass()),
            TypeSpec::Predicate(predicate) => Ok(bind(predicate.clone(), field)),
            TypeSpec::Tag(tag) => {
                if let Some(builtin) = TypeTag::parse(tag) {
                    return Ok(tag_validator(builtin, field));
                }
                if let Some(predicate) = self.custom.get(tag) {
                    return Ok(bind(predicate.clone(), field));
                }
                if self.strict {
                    return Err(RegistryError::unknown_type(tag.as_str(), field));
                }
                tracing::warn!(tag = %tag, field = %field, "unknown type tag; values will not be checked");
                Ok(pass())
            }
        }
    }
}

/// A validator that accepts everything.
pub fn pass() -> Validator {
    Rc::new(|_: &Value| None)
}

/// Check a built-in tag, reporting `"{field} must be a {tag}"`.
pub(crate) fn tag_validator(tag: TypeTag, field: &str) -> Validator {
    let message = format!("{} must be a {}", field, tag.name());
    Rc::new(move |value: &Value| {
        if tag.matches(value) {
            None
        } else {
            Some(message.clone())
        }
    })
}

fn bind(predicate: Predicate, field: &str) -> Validator {
    let field = field.to_string();
    Rc::new(move |value: &Value| predicate(value, &field))
}
