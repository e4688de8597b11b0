//! The open-transaction set of a node.

use crate::{Transaction, TransactionError, TransactionId, TransactionResult};
use arbor_core::Value;
use std::rc::Rc;

/// Transactions currently tracked by one node.
#[derive(Debug, Default)]
pub struct TransactionSet {
    open: Vec<Rc<Transaction>>,
}

impl TransactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and track a new transaction.
    pub fn begin(
        &mut self,
        id: TransactionId,
        name: impl Into<String>,
        params: Vec<Value>,
        target: impl Into<String>,
    ) -> Rc<Transaction> {
        let txn = Rc::new(Transaction::new(id, name, params, target));
        self.open.push(txn.clone());
        txn
    }

    /// Close `txn` and stop tracking it.
    pub fn close(&mut self, txn: &Transaction) -> TransactionResult<()> {
        let Some(index) = self.open.iter().position(|t| t.id == txn.id) else {
            if !txn.is_open() {
                return Err(TransactionError::AlreadyClosed(txn.id));
            }
            return Err(TransactionError::NotTracked(txn.id));
        };
        if !txn.close() {
            return Err(TransactionError::AlreadyClosed(txn.id));
        }
        self.open.remove(index);
        Ok(())
    }

    /// Number of open transactions.
    pub fn count(&self) -> usize {
        self.open.iter().filter(|t| t.is_open()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Tracked transactions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Transaction>> {
        self.open.iter()
    }
}
