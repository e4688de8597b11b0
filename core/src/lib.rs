//! Arbor Core Types
//!
//! This crate provides the foundational types shared by every arbor crate:
//! - The `Value` enum stored in scalar nodes and produced as snapshots
//! - Identifier rules and generated action names
//! - Change and error records carried on node channels
//! - Common error types

mod error;
mod naming;
mod record;
mod value;

pub use error::*;
pub use naming::*;
pub use record::*;
pub use value::*;
