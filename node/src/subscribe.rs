//! Subscriptions to a node's value and error channels.

use crate::channel::ListenerId;
use crate::node::NodeInner;
use crate::{Listener, Node};
use arbor_core::{ChangeRecord, ErrorRecord, Value};
use std::rc::{Rc, Weak};

/// Callbacks for `Node::subscribe`. Every callback is optional.
#[derive(Default, Clone)]
pub struct Observer {
    on_value: Option<Rc<dyn Fn(&Value)>>,
    on_error: Option<Rc<dyn Fn(&ErrorRecord)>>,
    on_complete: Option<Rc<dyn Fn()>>,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the node's value at subscription and after each
    /// emission that is not withheld by a transaction.
    pub fn on_value(mut self, f: impl Fn(&Value) + 'static) -> Self {
        self.on_value = Some(Rc::new(f));
        self
    }

    /// Called for each managed error. The subscription stays open.
    pub fn on_error(mut self, f: impl Fn(&ErrorRecord) + 'static) -> Self {
        self.on_error = Some(Rc::new(f));
        self
    }

    /// Called once, when the node completes.
    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.on_complete = Some(Rc::new(f));
        self
    }
}

/// Which channel a subscription listens on.
#[derive(Debug, Clone, Copy)]
enum Channel {
    Current,
    Errors,
    Changes,
}

/// Handle returned by `subscribe`, `watch` and `watch_flat`.
#[derive(Clone)]
pub struct Subscription {
    node: Weak<NodeInner>,
    listeners: Vec<(Channel, ListenerId)>,
}

impl Subscription {
    fn new(node: &Node) -> Self {
        Self {
            node: Rc::downgrade(&node.inner),
            listeners: Vec::new(),
        }
    }

    /// Stop receiving. Does not call `on_complete`.
    pub fn unsubscribe(&self) {
        let Some(inner) = self.node.upgrade() else {
            return;
        };
        for (channel, id) in &self.listeners {
            match channel {
                Channel::Current => inner.current.unlisten(*id),
                Channel::Errors => inner.errors.unlisten(*id),
                Channel::Changes => inner.changes.unlisten(*id),
            };
        }
    }

    /// Whether any callback can still fire.
    pub fn is_active(&self) -> bool {
        let Some(inner) = self.node.upgrade() else {
            return false;
        };
        self.listeners.iter().any(|(channel, id)| match channel {
            Channel::Current => inner.current.is_listening(*id),
            Channel::Errors => inner.errors.is_listening(*id),
            Channel::Changes => inner.changes.is_listening(*id),
        })
    }
}

impl Node {
    /// Observe the node's value and errors.
    ///
    /// `on_value` fires immediately with the current value, then whenever
    /// a change lands while no transaction is open, and once each time the
    /// last open transaction closes. Errors never end the subscription;
    /// only `complete` does.
    pub fn subscribe(&self, observer: Observer) -> Subscription {
        let Observer {
            on_value,
            on_error,
            on_complete,
        } = observer;
        let mut subscription = Subscription::new(self);
        if self.is_completed() {
            if let Some(on_complete) = on_complete {
                on_complete();
            }
            return subscription;
        }

        let deliver = on_value.clone();
        let id = self.inner.current.listen(
            move |value: &Value| {
                if let Some(on_value) = &deliver {
                    on_value(value);
                }
                true
            },
            on_complete,
        );
        subscription.listeners.push((Channel::Current, id));

        if let Some(on_error) = on_error {
            let id = self.inner.errors.listen(
                move |record: &ErrorRecord| {
                    on_error(record);
                    true
                },
                None,
            );
            subscription.listeners.push((Channel::Errors, id));
        }

        if let Some(on_value) = on_value {
            on_value(&self.value());
        }
        subscription
    }

    /// Observe raw change records.
    ///
    /// With a child name, only that child's own changes as re-emitted by
    /// this node are delivered. Without one, every change is.
    pub fn watch(
        &self,
        child: Option<&str>,
        f: impl Fn(&Node, &ChangeRecord) + 'static,
    ) -> Subscription {
        let node = Rc::downgrade(&self.inner);
        let child = child.map(str::to_string);
        let id = self.inner.changes.listen(
            move |change: &ChangeRecord| {
                let Some(inner) = node.upgrade() else {
                    return false;
                };
                let node = Node { inner };
                let wanted = match &child {
                    Some(child) => {
                        change.name == *child
                            && change.target.as_deref() == Some(node.name())
                    }
                    None => true,
                };
                if wanted {
                    f(&node, change);
                }
                true
            },
            None,
        );
        let mut subscription = Subscription::new(self);
        subscription.listeners.push((Channel::Changes, id));
        subscription
    }

    /// Like `watch`, delivering `[value, prev or null, name]` to a listener.
    pub fn watch_flat(&self, child: Option<&str>, listener: Listener) -> Subscription {
        let fallback = self.name().to_string();
        self.watch(child, move |node, change| {
            let name = if change.target.is_some() {
                change.name.clone()
            } else {
                fallback.clone()
            };
            let args = [
                change.value.clone(),
                change.prev.clone().unwrap_or_default(),
                Value::from(name),
            ];
            listener.deliver(node, &args);
        })
    }
}
