//! Single-threaded multicast subjects backing every node channel.
//!
//! Listeners are called in registration order. Emission never holds a borrow
//! of the listener table, so a listener may subscribe, unsubscribe or emit on
//! the same subject re-entrantly.

use std::cell::RefCell;
use std::rc::Rc;

/// Handle for removing a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

type OnNext<T> = Rc<dyn Fn(&T) -> bool>;
type OnComplete = Rc<dyn Fn()>;

struct Entry<T> {
    id: ListenerId,
    on_next: OnNext<T>,
    on_complete: Option<OnComplete>,
}

struct State<T> {
    next_id: u64,
    listeners: Vec<Entry<T>>,
    closed: bool,
}

/// A hot, multicast channel.
pub(crate) struct Subject<T> {
    state: RefCell<State<T>>,
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self {
            state: RefCell::new(State {
                next_id: 0,
                listeners: Vec::new(),
                closed: false,
            }),
        }
    }
}

impl<T> Subject<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returning `false` from `on_next` unsubscribes it.
    ///
    /// Listening on a closed subject calls `on_complete` immediately.
    pub fn listen(
        &self,
        on_next: impl Fn(&T) -> bool + 'static,
        on_complete: Option<OnComplete>,
    ) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        if state.closed {
            drop(state);
            if let Some(on_complete) = on_complete {
                on_complete();
            }
            return id;
        }
        state.listeners.push(Entry {
            id,
            on_next: Rc::new(on_next),
            on_complete,
        });
        id
    }

    pub fn unlisten(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|entry| entry.id != id);
        state.listeners.len() != before
    }

    pub fn is_listening(&self, id: ListenerId) -> bool {
        self.state
            .borrow()
            .listeners
            .iter()
            .any(|entry| entry.id == id)
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Deliver `item` to every current listener. No-op once closed.
    pub fn next(&self, item: &T) {
        let snapshot: Vec<(ListenerId, OnNext<T>)> = {
            let state = self.state.borrow();
            if state.closed {
                return;
            }
            state
                .listeners
                .iter()
                .map(|entry| (entry.id, entry.on_next.clone()))
                .collect()
        };

        let mut dropped = Vec::new();
        for (id, on_next) in snapshot {
            // removed by an earlier listener of this same emission
            if !self.is_listening(id) {
                continue;
            }
            if !on_next(item) {
                dropped.push(id);
            }
        }
        if !dropped.is_empty() {
            self.state
                .borrow_mut()
                .listeners
                .retain(|entry| !dropped.contains(&entry.id));
        }
    }

    /// Close the subject and notify listeners once. Idempotent.
    pub fn complete(&self) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.listeners)
        };
        for entry in listeners {
            if let Some(on_complete) = entry.on_complete {
                on_complete();
            }
        }
    }
}
