//! Arbor Transaction
//!
//! Transactions mark a multi-step mutation in progress on a node. While any
//! transaction is open the node keeps mutating its state but withholds
//! "current value" emissions; closing the last one releases a single emission.
//!
//! Responsibilities:
//! - Allocate monotonic transaction ids (per context, not global)
//! - Track the transaction set of one node
//! - Enforce the Open -> Closed state machine

mod error;
mod set;
mod transaction;

pub use error::{TransactionError, TransactionResult};
pub use set::TransactionSet;
pub use transaction::{Transaction, TransactionId, TransactionIds, TransactionState};
