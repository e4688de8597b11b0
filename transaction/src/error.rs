//! Transaction error types.

use crate::TransactionId;
use thiserror::Error;

/// Transaction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The transaction was already closed.
    #[error("transaction {0} is already closed")]
    AlreadyClosed(TransactionId),

    /// The transaction does not belong to this set.
    #[error("transaction {0} is not tracked by this node")]
    NotTracked(TransactionId),
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
