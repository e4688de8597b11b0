//! Arbor Node
//!
//! The state-tree engine. A `Node` is either a scalar slot or a composite of
//! named children. Writes are validated, cascade upward as change records, and
//! reach subscribers as value snapshots gated by open transactions.
//!
//! Responsibilities:
//! - Node data model (scalar, composite, branching)
//! - Action dispatch with transactional wrapping and async unwinding
//! - Change and error propagation from leaves to the root
//! - Filtered projections sharing child instances
//! - A per-node message bus keyed by topic

mod accessor;
mod action;
mod bus;
mod channel;
mod config;
mod context;
mod node;
mod projection;
mod subscribe;

pub use accessor::Accessor;
pub use action::{ActionResult, Handler, Outcome, PendingAction};
pub use bus::Listener;
pub use channel::ListenerId;
pub use config::{Config, ConfigError};
pub use context::Context;
pub use node::Node;
pub use subscribe::{Observer, Subscription};

pub use arbor_core::{
    vmap, values, ActionError, ChangeRecord, ErrorDetail, ErrorRecord, Fault, NodeError,
    NodeResult, Value, ValueMap,
};
pub use arbor_registry::{RangeSpec, Resolver, ResolverBuilder, TypeSpec, TypeTag};
