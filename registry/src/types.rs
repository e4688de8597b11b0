//! Type declarations for scalar nodes.

use arbor_core::Value;
use std::fmt;
use std::rc::Rc;

/// A resolved check. `None` means the value passes; `Some` carries the message.
pub type Validator = Rc<dyn Fn(&Value) -> Option<String>>;

/// A custom check receiving the value and the field name.
pub type Predicate = Rc<dyn Fn(&Value, &str) -> Option<String>>;

/// Built-in type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Number,
    Integer,
    Boolean,
    List,
    Map,
    Null,
}

impl TypeTag {
    /// Parse a tag, accepting the usual aliases.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(TypeTag::String),
            "number" => Some(TypeTag::Number),
            "int" | "integer" => Some(TypeTag::Integer),
            "bool" | "boolean" => Some(TypeTag::Boolean),
            "array" | "list" => Some(TypeTag::List),
            "object" | "map" => Some(TypeTag::Map),
            "null" => Some(TypeTag::Null),
            _ => None,
        }
    }

    /// Canonical tag name.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
            TypeTag::List => "list",
            TypeTag::Map => "map",
            TypeTag::Null => "null",
        }
    }

    /// Whether `value` belongs to this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeTag::String => value.is_string(),
            TypeTag::Number => value.is_number(),
            TypeTag::Integer => value.is_integer(),
            TypeTag::Boolean => value.is_bool(),
            TypeTag::List => value.is_list(),
            TypeTag::Map => value.is_map(),
            TypeTag::Null => value.is_null(),
        }
    }

    /// Scalar tags get distinct filtering: equal writes are not re-emitted.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeTag::String | TypeTag::Number | TypeTag::Integer | TypeTag::Boolean
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The type declared for a scalar node.
#[derive(Clone, Default)]
pub enum TypeSpec {
    /// Untyped: every value passes.
    #[default]
    Any,
    /// A named tag, built-in or registered.
    Tag(String),
    /// An inline predicate.
    Predicate(Predicate),
}

impl TypeSpec {
    /// Declare an inline predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value, &str) -> Option<String> + 'static,
    {
        TypeSpec::Predicate(Rc::new(f))
    }

    /// The built-in tag, if this spec names one.
    pub fn builtin(&self) -> Option<TypeTag> {
        match self {
            TypeSpec::Tag(tag) => TypeTag::parse(tag),
            _ => None,
        }
    }

    /// Whether writes of this type are filtered for distinctness.
    pub fn is_scalar(&self) -> bool {
        self.builtin().is_some_and(|tag| tag.is_scalar())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeSpec::Any)
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Any => write!(f, "Any"),
            TypeSpec::Tag(tag) => write!(f, "Tag({})", tag),
            TypeSpec::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(tag: &str) -> Self {
        TypeSpec::Tag(tag.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(tag: String) -> Self {
        TypeSpec::Tag(tag)
    }
}

impl From<TypeTag> for TypeSpec {
    fn from(tag: TypeTag) -> Self {
        TypeSpec::Tag(tag.name().to_string())
    }
}

impl From<Option<&str>> for TypeSpec {
    fn from(tag: Option<&str>) -> Self {
        tag.map(TypeSpec::from).unwrap_or_default()
    }
}
