//! ResolverBuilder for constructing an immutable Resolver.

use crate::{Predicate, Resolver, TypeTag};
use arbor_core::{NodeError, Value};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Errors raised while building or consulting a resolver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Duplicate type tag: {0}")]
    DuplicateTag(String),

    #[error("Type tag {0} shadows a built-in tag")]
    BuiltinTag(String),

    #[error("Unknown type tag {tag} for {field}")]
    UnknownType { tag: String, field: String },

    #[error("Invalid range for {field}: min {min} exceeds max {max}")]
    InvalidRange { field: String, min: f64, max: f64 },
}

impl RegistryError {
    pub fn unknown_type(tag: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownType {
            tag: tag.into(),
            field: field.into(),
        }
    }
}

impl From<RegistryError> for NodeError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownType { tag, field } => NodeError::unknown_type(tag, field),
            other => NodeError::registry(other.to_string()),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Builder for constructing an immutable Resolver.
#[derive(Default)]
pub struct ResolverBuilder {
    /// Custom tags by name.
    custom: HashMap<String, Predicate>,
    /// Reject unknown tags instead of passing everything.
    strict: bool,
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown tags become `RegistryError::UnknownType` at resolution time.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Register a custom tag.
    pub fn register<F>(mut self, tag: impl Into<String>, predicate: F) -> RegistryResult<Self>
    where
        F: Fn(&Value, &str) -> Option<String> + 'static,
    {
        let tag = tag.into();
        if TypeTag::parse(&tag).is_some() {
            return Err(RegistryError::BuiltinTag(tag));
        }
        if self.custom.contains_key(&tag) {
            return Err(RegistryError::DuplicateTag(tag));
        }
        self.custom.insert(tag, Rc::new(predicate));
        Ok(self)
    }

    pub fn build(self) -> Resolver {
        Resolver::new(self.custom, self.strict)
    }
}
