//! Named property access limited to a composite's children.

use crate::Node;
use arbor_core::{NodeError, NodeResult, Value};

/// Reads and writes children by name, through `get` and `set_child`.
///
/// The name set is fixed when the accessor is built; children added later
/// are not reachable through it.
#[derive(Debug, Clone)]
pub struct Accessor {
    node: Node,
    names: Vec<String>,
}

impl Accessor {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if !self.contains(name) {
            return None;
        }
        self.node.get(name)
    }

    /// Write `name`. Returns false for names outside the set.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> bool {
        if !self.contains(name) {
            tracing::warn!(node = %self.node.path(), property = name, "no such property");
            return false;
        }
        self.node.set_child(name, value);
        true
    }
}

impl Node {
    pub fn accessor(&self) -> NodeResult<Accessor> {
        if self.is_scalar() {
            return Err(NodeError::not_composite(self.path()));
        }
        Ok(Accessor {
            node: self.clone(),
            names: self.child_names(),
        })
    }
}
