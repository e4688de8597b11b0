//! Common error types for arbor.

use crate::Value;
use thiserror::Error;

/// Result type for structural node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Contract violations raised at the call site.
///
/// Runtime data problems (a rejected write, a failing action) are not
/// `NodeError`s: they travel on the node's error channel instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    #[error("cannot add to {owner}: bad name {name:?}")]
    InvalidName { owner: String, name: String },

    #[error("{node} holds a single value and cannot have children")]
    NotComposite { node: String },

    #[error("{node} already has a child named {child}")]
    DuplicateChild { node: String, child: String },

    #[error("{node} has no child named {child}")]
    UnknownChild { node: String, child: String },

    #[error("{node} has no action named {action}")]
    UnknownAction { node: String, action: String },

    #[error("projection of {node} requires at least one child name")]
    EmptyProjection { node: String },

    #[error("topic names must be non-empty (node {node})")]
    InvalidTopic { node: String },

    #[error("initial value of {node} rejected: {message}")]
    InvalidInitialValue { node: String, message: String },

    #[error("unknown type tag {tag} for {field}")]
    UnknownType { tag: String, field: String },

    #[error("registry error: {message}")]
    Registry { message: String },
}

impl NodeError {
    pub fn invalid_name(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::InvalidName {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn not_composite(node: impl Into<String>) -> Self {
        Self::NotComposite { node: node.into() }
    }

    pub fn duplicate_child(node: impl Into<String>, child: impl Into<String>) -> Self {
        Self::DuplicateChild {
            node: node.into(),
            child: child.into(),
        }
    }

    pub fn unknown_child(node: impl Into<String>, child: impl Into<String>) -> Self {
        Self::UnknownChild {
            node: node.into(),
            child: child.into(),
        }
    }

    pub fn unknown_action(node: impl Into<String>, action: impl Into<String>) -> Self {
        Self::UnknownAction {
            node: node.into(),
            action: action.into(),
        }
    }

    pub fn empty_projection(node: impl Into<String>) -> Self {
        Self::EmptyProjection { node: node.into() }
    }

    pub fn invalid_topic(node: impl Into<String>) -> Self {
        Self::InvalidTopic { node: node.into() }
    }

    pub fn invalid_initial_value(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInitialValue {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn unknown_type(tag: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownType {
            tag: tag.into(),
            field: field.into(),
        }
    }

    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }
}

/// The failure an action body reports instead of returning a value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Fault {
    pub message: String,
    /// Structured payload describing the failure, if any.
    pub data: Option<Value>,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            message: message.into(),
            data: Some(data.into()),
        }
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<NodeError> for Fault {
    fn from(e: NodeError) -> Self {
        Self::new(e.to_string())
    }
}

/// An action failure as captured by the dispatcher.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("action {action} failed: {fault}")]
pub struct ActionError {
    pub action: String,
    pub params: Vec<Value>,
    pub fault: Fault,
}

impl ActionError {
    pub fn new(action: impl Into<String>, params: Vec<Value>, fault: Fault) -> Self {
        Self {
            action: action.into(),
            params,
            fault,
        }
    }

    /// The fault message.
    pub fn message(&self) -> &str {
        &self.fault.message
    }
}
