//! Transaction records.

use arbor_core::Value;
use std::cell::Cell;
use std::fmt;

/// Unique identifier for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Monotonic id allocator. One per context.
#[derive(Debug, Default)]
pub struct TransactionIds {
    next: Cell<u64>,
}

impl TransactionIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn allocate(&self) -> TransactionId {
        let id = self.next.get();
        self.next.set(id + 1);
        TransactionId::new(id)
    }
}

/// Transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// The owning action has not settled yet.
    Open,
    /// Terminal.
    Closed,
}

/// One invocation of a transactional action.
#[derive(Debug)]
pub struct Transaction {
    pub id: TransactionId,
    /// Action name.
    pub name: String,
    /// Arguments of the invocation.
    pub params: Vec<Value>,
    /// Path of the owning node.
    pub target: String,
    state: Cell<TransactionState>,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        name: impl Into<String>,
        params: Vec<Value>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            params,
            target: target.into(),
            state: Cell::new(TransactionState::Open),
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state.get() == TransactionState::Open
    }

    /// Move to Closed. Returns false if it was closed already.
    pub(crate) fn close(&self) -> bool {
        self.state.replace(TransactionState::Closed) == TransactionState::Open
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction {} {} on {} (", self.id, self.name, self.target)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}
