//! Filtered projections.

use crate::Node;
use arbor_core::{NodeError, NodeResult};
use std::rc::Rc;

impl Node {
    /// A composite exposing only `names`, sharing the child instances.
    ///
    /// The projection is named `{name}_filtered_{a}_{b}...`. Writes through
    /// either side are seen by both. Transactions open on this node hold
    /// back the projection's emissions as well.
    pub fn filtered(&self, names: &[&str]) -> NodeResult<Node> {
        if names.is_empty() {
            return Err(NodeError::empty_projection(self.path()));
        }
        if self.is_scalar() {
            return Err(NodeError::not_composite(self.path()));
        }
        let children = names
            .iter()
            .map(|name| {
                self.child(name)
                    .ok_or_else(|| NodeError::unknown_child(self.path(), *name))
            })
            .collect::<NodeResult<Vec<_>>>()?;

        let name = format!("{}_filtered_{}", self.name(), names.join("_"));
        let view = Node::new_composite(&self.inner.ctx, &name);
        for child in &children {
            view.add_node(child)?;
        }

        view.inner.mirrored.set(self.transaction_count());
        let weak = Rc::downgrade(&view.inner);
        self.inner.counts.listen(
            move |count: &usize| {
                let Some(inner) = weak.upgrade() else {
                    return false;
                };
                let view = Node { inner };
                view.inner.mirrored.set(*count);
                view.count_changed();
                true
            },
            None,
        );
        tracing::debug!(node = %self.path(), view = %name, "projection created");
        Ok(view)
    }
}
