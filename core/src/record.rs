//! Records carried on node channels.
//!
//! A `ChangeRecord` describes one scalar mutation; an `ErrorRecord` describes
//! one managed (non-terminal) error. Both are re-tagged with provenance as
//! they cascade from a child to each ancestor.

use crate::{ActionError, Value};

/// One scalar mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// Name of the node (or property) that changed.
    pub name: String,
    /// The new value.
    pub value: Value,
    /// The previous value; absent on the first emission of a node.
    pub prev: Option<Value>,
    /// Child the change arrived from, once cascaded.
    pub source: Option<String>,
    /// Ancestor that re-emitted the change, once cascaded.
    pub target: Option<String>,
    /// True when synthesized by `broadcast` rather than a write.
    pub broadcast: bool,
}

impl ChangeRecord {
    /// A direct mutation of node `name`.
    pub fn new(name: impl Into<String>, value: Value, prev: Option<Value>) -> Self {
        Self {
            name: name.into(),
            value,
            prev,
            source: None,
            target: None,
            broadcast: false,
        }
    }

    /// A manual notification for a value that changed in place.
    pub fn broadcast(name: impl Into<String>, value: Value, target: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            prev: None,
            source: None,
            target,
            broadcast: true,
        }
    }

    /// Re-tag this change as it passes from child `source` into `target`.
    pub fn cascade(&self, source: &str, target: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            target: Some(target.to_string()),
            ..self.clone()
        }
    }
}

/// What went wrong, inside an `ErrorRecord`.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    /// A write failed its type or predicate check.
    Validation { message: String, value: Value },
    /// An action body failed or its asynchronous result was rejected.
    Action(ActionError),
    /// A free-form report.
    Message(String),
    /// A descendant's record, tagged with `source` and `target`.
    Cascade(Box<ErrorRecord>),
}

impl ErrorDetail {
    pub fn validation(message: impl Into<String>, value: Value) -> Self {
        Self::Validation {
            message: message.into(),
            value,
        }
    }
}

impl From<&str> for ErrorDetail {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for ErrorDetail {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<ActionError> for ErrorDetail {
    fn from(e: ActionError) -> Self {
        Self::Action(e)
    }
}

/// A managed error delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub error: ErrorDetail,
    /// Path of the node that emitted this record.
    pub id: String,
    /// Name of the node that emitted this record.
    pub name: String,
    pub source: Option<String>,
    pub target: Option<String>,
}

impl ErrorRecord {
    pub fn new(error: ErrorDetail, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            error,
            id: id.into(),
            name: name.into(),
            source: None,
            target: None,
        }
    }

    /// Wrap a child's record for re-emission by its parent.
    ///
    /// The child record keeps its own id and name and gains `source`/`target`;
    /// the wrapper carries the parent's id and name.
    pub fn cascade(
        child: &ErrorRecord,
        source: &str,
        target: &str,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let inner = ErrorRecord {
            source: Some(source.to_string()),
            target: Some(target.to_string()),
            ..child.clone()
        };
        Self::new(ErrorDetail::Cascade(Box::new(inner)), id, name)
    }

    /// The record as first emitted, before any cascading.
    pub fn origin(&self) -> &ErrorRecord {
        match &self.error {
            ErrorDetail::Cascade(inner) => inner.origin(),
            _ => self,
        }
    }

    /// Node paths from this record down to the origin.
    pub fn trail(&self) -> Vec<&str> {
        let mut trail = vec![self.id.as_str()];
        let mut current = self;
        while let ErrorDetail::Cascade(inner) = &current.error {
            trail.push(inner.id.as_str());
            current = &**inner;
        }
        trail
    }

    /// Human-readable message of the originating error.
    pub fn message(&self) -> String {
        match &self.origin().error {
            ErrorDetail::Validation { message, .. } => message.clone(),
            ErrorDetail::Action(e) => e.to_string(),
            ErrorDetail::Message(message) => message.clone(),
            // origin() never stops on a cascade
            ErrorDetail::Cascade(inner) => inner.message(),
        }
    }
}
