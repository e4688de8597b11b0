//! Range-limited numeric declarations.

use crate::resolver::tag_validator;
use crate::{RegistryError, RegistryResult, TypeSpec, TypeTag};
use arbor_core::Value;

/// A numeric type with optional inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    pub tag: TypeTag,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self {
            tag: TypeTag::Number,
            min: None,
            max: None,
        }
    }
}

impl RangeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: TypeTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Pull a numeric value inside the bounds. Non-numeric values are returned as-is.
    ///
    /// Integer values and integer ranges clamp to the nearest whole number
    /// inside the bounds.
    pub fn clamp(&self, value: Value) -> Value {
        let Some(n) = value.as_f64() else {
            return value;
        };
        let whole = matches!(value, Value::Int(_)) || self.tag == TypeTag::Integer;
        let mut clamped = n;
        if let Some(min) = self.min {
            clamped = clamped.max(if whole { min.ceil() } else { min });
        }
        if let Some(max) = self.max {
            clamped = clamped.min(if whole { max.floor() } else { max });
        }
        if clamped == n {
            return value;
        }
        match value {
            _ if whole && clamped.fract() == 0.0 => Value::Int(clamped as i64),
            _ => Value::Float(clamped),
        }
    }

    /// Build the declaration checked on every write to `field`.
    pub fn to_type_spec(&self, field: &str) -> RegistryResult<TypeSpec> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(RegistryError::InvalidRange {
                    field: field.to_string(),
                    min,
                    max,
                });
            }
        }
        let type_check = tag_validator(self.tag, field);
        let (min, max) = (self.min, self.max);
        Ok(TypeSpec::predicate(move |value, field| {
            if let Some(message) = type_check(value) {
                return Some(message);
            }
            // the type check above only admits numbers for numeric tags
            let n = value.as_f64()?;
            if let Some(min) = min {
                if n < min {
                    return Some(format!("{} must be >= {}", field, min));
                }
            }
            if let Some(max) = max {
                if n > max {
                    return Some(format!("{} must be <= {}", field, max));
                }
            }
            None
        }))
    }
}
