//! The Context - shared configuration, type resolution and scheduling.

use crate::{Config, Node};
use arbor_core::{ensure_identifier, NodeError, NodeResult, Value};
use arbor_registry::{Resolver, ResolverBuilder, TypeSpec, Validator};
use arbor_transaction::{TransactionId, TransactionIds};
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Everything the nodes of one tree share.
///
/// Cloning is cheap; clones refer to the same context. Asynchronous action
/// continuations run on the context's single-threaded pool, which the owner
/// drives with `run_until_stalled` or `run_until`.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

struct ContextInner {
    config: Config,
    resolver: Resolver,
    ids: TransactionIds,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let resolver = ResolverBuilder::new().strict(config.strict_types).build();
        Self::with_resolver(config, resolver)
    }

    /// Use a resolver carrying custom type tags.
    pub fn with_resolver(config: Config, resolver: Resolver) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            inner: Rc::new(ContextInner {
                config,
                resolver,
                ids: TransactionIds::new(),
                pool: RefCell::new(pool),
                spawner,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.inner.resolver
    }

    /// Create a root composite node.
    pub fn composite(&self, name: &str) -> NodeResult<Node> {
        ensure_identifier("context", name)?;
        Ok(Node::new_composite(self, name))
    }

    /// Create a root scalar node.
    pub fn scalar(
        &self,
        name: &str,
        value: impl Into<Value>,
        ty: impl Into<TypeSpec>,
    ) -> NodeResult<Node> {
        ensure_identifier("context", name)?;
        Node::new_scalar(self, name, value.into(), ty.into())
    }

    /// Run spawned continuations until none can make progress.
    pub fn run_until_stalled(&self) {
        match self.inner.pool.try_borrow_mut() {
            Ok(mut pool) => pool.run_until_stalled(),
            Err(_) => tracing::warn!("run_until_stalled called from inside the executor; ignored"),
        }
    }

    /// Drive the pool until `future` resolves.
    ///
    /// Returns `None` when called from inside the executor.
    pub fn run_until<F: Future>(&self, future: F) -> Option<F::Output> {
        match self.inner.pool.try_borrow_mut() {
            Ok(mut pool) => Some(pool.run_until(future)),
            Err(_) => {
                tracing::warn!("run_until called from inside the executor; ignored");
                None
            }
        }
    }

    pub(crate) fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        if let Err(e) = self.inner.spawner.spawn_local(future) {
            tracing::warn!(error = %e, "failed to schedule action continuation");
        }
    }

    pub(crate) fn next_transaction_id(&self) -> TransactionId {
        self.inner.ids.allocate()
    }

    /// Resolve a declared type for `field`, honoring `strict_types`.
    pub(crate) fn validator(&self, spec: &TypeSpec, field: &str) -> NodeResult<Validator> {
        if let TypeSpec::Tag(tag) = spec {
            if self.inner.config.strict_types && !self.inner.resolver.knows(tag) {
                return Err(NodeError::unknown_type(tag.as_str(), field));
            }
        }
        Ok(self.inner.resolver.resolve(spec, field)?)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
