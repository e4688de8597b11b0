//! Action dispatch.
//!
//! An action body returns an `Outcome`. The dispatcher unwinds it until a
//! plain value remains: `Call` outcomes are invoked with the same node and
//! arguments, `Pending` outcomes are awaited on the context's pool. Failures
//! never reach the caller as `Err`; they are reported on the node's error
//! channel and the call resolves to `ActionResult::Error`.

use crate::Node;
use arbor_core::{ensure_identifier, ActionError, ErrorDetail, Fault, NodeError, NodeResult, Value};
use arbor_transaction::Transaction;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context as TaskContext, Poll};

/// An action body.
pub type Handler = Rc<dyn Fn(&Node, &[Value]) -> Result<Outcome, Fault>>;

/// What an action body produced.
pub enum Outcome {
    /// Terminal.
    Value(Value),
    /// Invoke this next, with the same node and arguments.
    Call(Handler),
    /// Settles later.
    Pending(LocalBoxFuture<'static, Result<Outcome, Fault>>),
}

impl Outcome {
    /// A terminal null.
    pub fn done() -> Self {
        Outcome::Value(Value::Null)
    }

    pub fn call<F>(f: F) -> Self
    where
        F: Fn(&Node, &[Value]) -> Result<Outcome, Fault> + 'static,
    {
        Outcome::Call(Rc::new(f))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Outcome, Fault>> + 'static,
    {
        Outcome::Pending(future.boxed_local())
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Outcome::Call(_) => f.write_str("Call(..)"),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

#[derive(Clone)]
pub(crate) struct ActionDef {
    pub handler: Handler,
    pub transactional: bool,
}

/// What `act` returns.
#[derive(Clone)]
pub enum ActionResult {
    Value(Value),
    /// The failure, already reported on the error channel.
    Error(ActionError),
    /// Still running; resolves to `Value` or `Error`.
    Pending(PendingAction),
}

impl ActionResult {
    pub fn value(&self) -> Option<&Value> {
        match self {
            ActionResult::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ActionError> {
        match self {
            ActionResult::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ActionResult::Pending(_))
    }

    /// The pending handle, if the action has not settled.
    pub fn pending(&self) -> Option<PendingAction> {
        match self {
            ActionResult::Pending(pending) => Some(pending.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ActionResult::Error(e) => f.debug_tuple("Error").field(e).finish(),
            ActionResult::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// A cloneable handle to an action still in flight.
///
/// The continuation is also spawned on the context pool, so dropping the
/// handle does not cancel it.
#[derive(Clone)]
pub struct PendingAction {
    inner: Shared<LocalBoxFuture<'static, ActionResult>>,
}

impl PendingAction {
    /// The settled result, if available.
    pub fn peek(&self) -> Option<ActionResult> {
        self.inner.peek().cloned()
    }
}

impl Future for PendingAction {
    type Output = ActionResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<ActionResult> {
        self.inner.poll_unpin(cx)
    }
}

enum Unwound {
    Settled(ActionResult),
    Suspended(LocalBoxFuture<'static, Result<Outcome, Fault>>),
}

impl Node {
    /// Register a non-transactional action.
    ///
    /// A name that is already registered keeps its first handler.
    pub fn define_action<F>(&self, name: &str, handler: F) -> NodeResult<&Self>
    where
        F: Fn(&Node, &[Value]) -> Result<Outcome, Fault> + 'static,
    {
        self.register(name, Rc::new(handler), false)
    }

    /// Register an action that holds a transaction open until it settles.
    pub fn define_transactional<F>(&self, name: &str, handler: F) -> NodeResult<&Self>
    where
        F: Fn(&Node, &[Value]) -> Result<Outcome, Fault> + 'static,
    {
        self.register(name, Rc::new(handler), true)
    }

    fn register(&self, name: &str, handler: Handler, transactional: bool) -> NodeResult<&Self> {
        ensure_identifier(&self.path(), name)?;
        let mut actions = self.inner.actions.borrow_mut();
        if actions.contains_key(name) {
            drop(actions);
            tracing::warn!(node = %self.path(), action = name, "action already defined; keeping the first");
            return Ok(self);
        }
        actions.insert(
            name.to_string(),
            ActionDef {
                handler,
                transactional,
            },
        );
        Ok(self)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.inner.actions.borrow().contains_key(name)
    }

    /// Action names in registration order.
    pub fn action_names(&self) -> Vec<String> {
        self.inner.actions.borrow().keys().cloned().collect()
    }

    /// Invoke the action `name`.
    pub fn act(&self, name: &str, args: &[Value]) -> NodeResult<ActionResult> {
        let def = self
            .inner
            .actions
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| NodeError::unknown_action(self.path(), name))?;
        Ok(self.perform(name, def, args))
    }

    fn perform(&self, name: &str, def: ActionDef, args: &[Value]) -> ActionResult {
        let txn = def
            .transactional
            .then(|| self.open_transaction(name, args));
        match self.unwind(name, args, (def.handler)(self, args)) {
            Unwound::Settled(result) => {
                if let Some(txn) = txn {
                    self.close_transaction(&txn);
                }
                result
            }
            Unwound::Suspended(pending) => {
                ActionResult::Pending(self.track(name, args, pending, txn))
            }
        }
    }

    /// Follow `Call` outcomes until a value, a failure or a suspension.
    fn unwind(&self, name: &str, args: &[Value], mut outcome: Result<Outcome, Fault>) -> Unwound {
        loop {
            match outcome {
                Ok(Outcome::Value(value)) => return Unwound::Settled(ActionResult::Value(value)),
                Ok(Outcome::Call(next)) => outcome = next(self, args),
                Ok(Outcome::Pending(future)) => return Unwound::Suspended(future),
                Err(fault) => return Unwound::Settled(self.action_failed(name, args, fault)),
            }
        }
    }

    async fn settle(
        self,
        name: String,
        args: Vec<Value>,
        mut pending: LocalBoxFuture<'static, Result<Outcome, Fault>>,
    ) -> ActionResult {
        loop {
            let outcome = pending.await;
            match self.unwind(&name, &args, outcome) {
                Unwound::Settled(result) => return result,
                Unwound::Suspended(next) => pending = next,
            }
        }
    }

    fn track(
        &self,
        name: &str,
        args: &[Value],
        pending: LocalBoxFuture<'static, Result<Outcome, Fault>>,
        txn: Option<Rc<Transaction>>,
    ) -> PendingAction {
        let node = self.clone();
        let continuation = self.clone().settle(name.to_string(), args.to_vec(), pending);
        let inner = async move {
            let result = continuation.await;
            if let Some(txn) = txn {
                node.close_transaction(&txn);
            }
            result
        }
        .boxed_local()
        .shared();
        self.inner.ctx.spawn(inner.clone().map(|_| ()));
        PendingAction { inner }
    }

    fn action_failed(&self, name: &str, args: &[Value], fault: Fault) -> ActionResult {
        let error = ActionError::new(name, args.to_vec(), fault);
        tracing::debug!(node = %self.path(), action = name, error = %error, "action failed");
        self.emit_error(ErrorDetail::Action(error.clone()));
        ActionResult::Error(error)
    }
}
