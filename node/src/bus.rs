//! Per-node message bus keyed by topic.
//!
//! Independent of the value channels: no transactions, no cascading.

use crate::channel::ListenerId;
use crate::Node;
use arbor_core::{NodeError, NodeResult, Value};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Receiver of bus messages and `watch_flat` deliveries.
#[derive(Clone)]
pub enum Listener {
    /// Called with the node and the message arguments.
    Call(Rc<dyn Fn(&Node, &[Value])>),
    /// Invoke the named action of the node with the message arguments.
    Action(String),
}

impl Listener {
    pub fn call(f: impl Fn(&Node, &[Value]) + 'static) -> Self {
        Listener::Call(Rc::new(f))
    }

    pub fn action(name: impl Into<String>) -> Self {
        Listener::Action(name.into())
    }

    pub(crate) fn deliver(&self, node: &Node, args: &[Value]) {
        match self {
            Listener::Call(f) => f(node, args),
            Listener::Action(name) => {
                if let Err(e) = node.act(name, args) {
                    tracing::warn!(node = %node.path(), action = %name, error = %e, "listener names a missing action");
                }
            }
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Call(_) => f.write_str("Call(..)"),
            Listener::Action(name) => f.debug_tuple("Action").field(name).finish(),
        }
    }
}

#[derive(Default)]
pub(crate) struct Bus {
    next_id: u64,
    topics: IndexMap<String, Vec<(ListenerId, Listener)>>,
}

impl Bus {
    pub fn clear(&mut self) {
        self.topics.clear();
    }
}

impl Node {
    /// Register `listener` for `topic`.
    pub fn on(&self, topic: &str, listener: Listener) -> NodeResult<ListenerId> {
        if topic.is_empty() {
            return Err(NodeError::invalid_topic(self.path()));
        }
        let mut bus = self.inner.bus.borrow_mut();
        let id = ListenerId(bus.next_id);
        bus.next_id += 1;
        bus.topics
            .entry(topic.to_string())
            .or_default()
            .push((id, listener));
        Ok(id)
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off(&self, topic: &str, id: ListenerId) -> bool {
        let mut bus = self.inner.bus.borrow_mut();
        let Some(listeners) = bus.topics.get_mut(topic) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Remove every listener of `topic`, returning how many there were.
    pub fn off_all(&self, topic: &str) -> usize {
        self.inner
            .bus
            .borrow_mut()
            .topics
            .shift_remove(topic)
            .map_or(0, |listeners| listeners.len())
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.inner
            .bus
            .borrow()
            .topics
            .get(topic)
            .map_or(0, Vec::len)
    }

    /// Deliver `args` to every listener of `topic`, in registration order.
    pub fn emit(&self, topic: &str, args: &[Value]) -> NodeResult<&Self> {
        if topic.is_empty() {
            return Err(NodeError::invalid_topic(self.path()));
        }
        let listeners: Vec<Listener> = self
            .inner
            .bus
            .borrow()
            .topics
            .get(topic)
            .map(|listeners| listeners.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener.deliver(self, args);
        }
        Ok(self)
    }
}
