//! The Node - scalar slots, composites and the wiring between them.

use crate::action::ActionDef;
use crate::bus::Bus;
use crate::channel::Subject;
use crate::Context;
use arbor_core::{
    ensure_identifier, setter_name, ActionError, ChangeRecord, ErrorDetail, ErrorRecord, Fault,
    NodeError, NodeResult, Value,
};
use arbor_registry::{RangeSpec, TypeSpec, Validator};
use arbor_transaction::{Transaction, TransactionSet};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A handle to one entry of the state tree.
///
/// Cloning a `Node` clones the handle: both refer to the same entry.
#[derive(Clone)]
pub struct Node {
    pub(crate) inner: Rc<NodeInner>,
}

pub(crate) struct NodeInner {
    pub(crate) name: String,
    pub(crate) ctx: Context,
    /// Only used to compute the path.
    parent: RefCell<Weak<NodeInner>>,
    body: RefCell<Body>,
    pub(crate) actions: RefCell<IndexMap<String, ActionDef>>,
    transactions: RefCell<TransactionSet>,
    /// Open transactions of the node a projection was taken from.
    pub(crate) mirrored: Cell<usize>,
    pub(crate) changes: Subject<ChangeRecord>,
    pub(crate) errors: Subject<ErrorRecord>,
    pub(crate) counts: Subject<usize>,
    pub(crate) current: Subject<Value>,
    pub(crate) bus: RefCell<Bus>,
    completed: Cell<bool>,
}

enum Body {
    Scalar(Slot),
    Composite(IndexMap<String, Node>),
}

struct Slot {
    value: Value,
    spec: TypeSpec,
    validator: Validator,
    distinct: bool,
    /// False until the slot holds a value someone put there.
    assigned: bool,
}

impl Slot {
    fn new(ctx: &Context, field: &str, value: Value, spec: TypeSpec) -> NodeResult<Self> {
        let validator = ctx.validator(&spec, field)?;
        if ctx.config().validate_initial && !value.is_null() {
            if let Some(message) = validator(&value) {
                return Err(NodeError::invalid_initial_value(field, message));
            }
        }
        Ok(Self {
            distinct: ctx.config().distinct_scalars && spec.is_scalar(),
            assigned: !value.is_null(),
            value,
            spec,
            validator,
        })
    }

    /// Move this slot under a new field name.
    fn rehost(self, ctx: &Context, field: &str) -> NodeResult<Self> {
        Ok(Self {
            validator: ctx.validator(&self.spec, field)?,
            ..self
        })
    }
}

impl Node {
    fn with_body(ctx: &Context, name: &str, body: Body) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                name: name.to_string(),
                ctx: ctx.clone(),
                parent: RefCell::new(Weak::new()),
                body: RefCell::new(body),
                actions: RefCell::new(IndexMap::new()),
                transactions: RefCell::new(TransactionSet::new()),
                mirrored: Cell::new(0),
                changes: Subject::new(),
                errors: Subject::new(),
                counts: Subject::new(),
                current: Subject::new(),
                bus: RefCell::new(Bus::default()),
                completed: Cell::new(false),
            }),
        }
    }

    pub(crate) fn new_composite(ctx: &Context, name: &str) -> Self {
        Self::with_body(ctx, name, Body::Composite(IndexMap::new()))
    }

    pub(crate) fn new_scalar(
        ctx: &Context,
        name: &str,
        value: Value,
        spec: TypeSpec,
    ) -> NodeResult<Self> {
        let slot = Slot::new(ctx, name, value, spec)?;
        Ok(Self::with_body(ctx, name, Body::Scalar(slot)))
    }

    // ---------- identity ----------

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Dotted path from the root, e.g. `scene.coord.x`.
    pub fn path(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{}.{}", parent.path(), self.name()),
            None => self.inner.name.clone(),
        }
    }

    pub fn parent(&self) -> Option<Node> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Node { inner })
    }

    pub fn context(&self) -> &Context {
        &self.inner.ctx
    }

    pub fn is_scalar(&self) -> bool {
        matches!(*self.inner.body.borrow(), Body::Scalar(_))
    }

    pub fn is_composite(&self) -> bool {
        !self.is_scalar()
    }

    pub fn is_completed(&self) -> bool {
        self.inner.completed.get()
    }

    /// Whether two handles refer to the same node.
    pub fn same_node(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The declared type of a scalar node.
    pub fn type_spec(&self) -> Option<TypeSpec> {
        match &*self.inner.body.borrow() {
            Body::Scalar(slot) => Some(slot.spec.clone()),
            Body::Composite(_) => None,
        }
    }

    // ---------- values ----------

    /// The stored value of a scalar, or a fresh map of child values.
    pub fn value(&self) -> Value {
        match &*self.inner.body.borrow() {
            Body::Scalar(slot) => slot.value.clone(),
            Body::Composite(children) => Value::Map(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.value()))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.value().to_json()
    }

    /// Write a scalar value.
    ///
    /// A value the validator rejects is reported on the error channel and
    /// leaves the stored value untouched.
    pub fn set(&self, value: impl Into<Value>) -> &Self {
        let value = value.into();
        if self.is_completed() {
            tracing::warn!(node = %self.path(), "set after complete; ignored");
            return self;
        }
        let validator = match &*self.inner.body.borrow() {
            Body::Scalar(slot) => Some(slot.validator.clone()),
            Body::Composite(_) => None,
        };
        let Some(validator) = validator else {
            tracing::warn!(node = %self.path(), "set called on a composite; use set_child");
            return self.emit_error(format!("{} is a composite; set a child instead", self.path()));
        };
        if let Some(message) = validator(&value) {
            return self.emit_error(ErrorDetail::validation(message, value));
        }

        let record = {
            let mut body = self.inner.body.borrow_mut();
            let Body::Scalar(slot) = &mut *body else {
                return self;
            };
            if slot.distinct && slot.assigned && same_scalar(&slot.value, &value) {
                tracing::trace!(node = %self.inner.name, "unchanged value suppressed");
                return self;
            }
            let prev = std::mem::replace(&mut slot.value, value.clone());
            let prev = slot.assigned.then_some(prev);
            slot.assigned = true;
            ChangeRecord::new(self.inner.name.as_str(), value, prev)
        };
        self.push_change(record);
        self
    }

    /// Write the child `name`. Unknown children are reported and ignored.
    pub fn set_child(&self, name: &str, value: impl Into<Value>) -> &Self {
        match self.child(name) {
            Some(child) => {
                child.set(value);
            }
            None => {
                tracing::warn!(node = %self.path(), child = name, "set of unknown child; ignored");
            }
        }
        self
    }

    /// Current value of the child `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.child(name) {
            Some(child) => Some(child.value()),
            None => {
                tracing::warn!(node = %self.path(), child = name, "get of unknown child");
                None
            }
        }
    }

    /// Mutate a scalar's stored value in place without emitting.
    ///
    /// Follow with `broadcast` to notify subscribers.
    pub fn modify(&self, f: impl FnOnce(&mut Value)) -> &Self {
        let taken = match &mut *self.inner.body.borrow_mut() {
            Body::Scalar(slot) => Some(std::mem::take(&mut slot.value)),
            Body::Composite(_) => None,
        };
        let Some(mut value) = taken else {
            tracing::warn!(node = %self.path(), "modify called on a composite; ignored");
            return self;
        };
        // the slot holds null while `f` runs
        f(&mut value);
        if let Body::Scalar(slot) = &mut *self.inner.body.borrow_mut() {
            slot.value = value;
        }
        self
    }

    /// Read-modify-write the child `name`.
    ///
    /// A failing closure is reported on this node's error channel.
    pub fn alter(
        &self,
        name: &str,
        f: impl FnOnce(&Value) -> Result<Value, Fault>,
    ) -> &Self {
        let Some(child) = self.child(name) else {
            tracing::warn!(node = %self.path(), child = name, "alter of unknown child; ignored");
            return self;
        };
        let current = child.value();
        match f(&current) {
            Ok(next) => {
                child.set(next);
                self
            }
            Err(fault) => self.emit_error(ActionError::new(
                "alter",
                vec![Value::from(name), current],
                fault,
            )),
        }
    }

    /// Push a change record for a value that mutated without `set`.
    ///
    /// With a property name the record carries that child's value; without
    /// one it carries this node's own value.
    pub fn broadcast(&self, property: Option<&str>) -> &Self {
        let record = match property {
            Some(property) => ChangeRecord::broadcast(
                property,
                self.get(property).unwrap_or_default(),
                Some(self.inner.name.clone()),
            ),
            None => ChangeRecord::broadcast(self.inner.name.as_str(), self.value(), None),
        };
        self.push_change(record);
        self
    }

    /// Report a managed error on this node's error channel.
    pub fn emit_error(&self, detail: impl Into<ErrorDetail>) -> &Self {
        let record = ErrorRecord::new(detail.into(), self.path(), self.inner.name.as_str());
        self.push_error(record);
        self
    }

    // ---------- structure ----------

    pub fn child(&self, name: &str) -> Option<Node> {
        match &*self.inner.body.borrow() {
            Body::Composite(children) => children.get(name).cloned(),
            Body::Scalar(_) => None,
        }
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Child names in insertion order.
    pub fn child_names(&self) -> Vec<String> {
        match &*self.inner.body.borrow() {
            Body::Composite(children) => children.keys().cloned().collect(),
            Body::Scalar(_) => Vec::new(),
        }
    }

    pub fn add_child(&self, name: &str, value: impl Into<Value>) -> NodeResult<&Self> {
        self.add_typed_child(name, value, TypeSpec::Any)
    }

    /// Add a scalar child validated against `ty`.
    pub fn add_typed_child(
        &self,
        name: &str,
        value: impl Into<Value>,
        ty: impl Into<TypeSpec>,
    ) -> NodeResult<&Self> {
        self.check_new_child(name)?;
        let child = Node::new_scalar(&self.inner.ctx, name, value.into(), ty.into())?;
        self.attach(&child)?;
        Ok(self)
    }

    /// Add a numeric child limited to `range`. The initial value is clamped.
    pub fn add_range_child(
        &self,
        name: &str,
        value: impl Into<Value>,
        range: RangeSpec,
    ) -> NodeResult<&Self> {
        let spec = range.to_type_spec(name)?;
        self.add_typed_child(name, range.clamp(value.into()), spec)
    }

    /// Add and return a nested composite child.
    pub fn add_composite(&self, name: &str) -> NodeResult<Node> {
        self.check_new_child(name)?;
        let child = Node::new_composite(&self.inner.ctx, name);
        self.attach(&child)?;
        Ok(child)
    }

    /// Attach an existing node under its own name.
    ///
    /// A node that already has a parent keeps its path.
    pub fn add_node(&self, node: &Node) -> NodeResult<&Self> {
        self.check_new_child(node.name())?;
        self.attach(node)?;
        Ok(self)
    }

    /// Turn a scalar into a composite.
    ///
    /// With a name, the old value and its type move into a child of that
    /// name; otherwise the value is dropped.
    pub fn branch(&self, name: Option<&str>) -> NodeResult<&Self> {
        if let Some(name) = name {
            ensure_identifier(&self.path(), name)?;
        }
        let previous = {
            let mut body = self.inner.body.borrow_mut();
            if matches!(*body, Body::Composite(_)) {
                drop(body);
                tracing::warn!(node = %self.path(), "branch of a composite; ignored");
                return Ok(self);
            }
            std::mem::replace(&mut *body, Body::Composite(IndexMap::new()))
        };
        if let (Some(name), Body::Scalar(slot)) = (name, previous) {
            let slot = slot.rehost(&self.inner.ctx, name)?;
            let child = Node::with_body(&self.inner.ctx, name, Body::Scalar(slot));
            self.attach(&child)?;
        }
        Ok(self)
    }

    fn check_new_child(&self, name: &str) -> NodeResult<()> {
        if self.is_scalar() {
            return Err(NodeError::not_composite(self.path()));
        }
        ensure_identifier(&self.path(), name)?;
        if self.has_child(name) {
            return Err(NodeError::duplicate_child(self.path(), name));
        }
        Ok(())
    }

    /// Store `child`, cascade its channels into ours and register its setter.
    fn attach(&self, child: &Node) -> NodeResult<()> {
        let name = child.name().to_string();
        let setter = setter_name(&name)?;
        {
            let mut body = self.inner.body.borrow_mut();
            let Body::Composite(children) = &mut *body else {
                return Err(NodeError::not_composite(self.path()));
            };
            if children.contains_key(&name) {
                return Err(NodeError::duplicate_child(self.path(), name));
            }
            children.insert(name.clone(), child.clone());
        }
        {
            let mut parent = child.inner.parent.borrow_mut();
            if parent.upgrade().is_none() {
                *parent = Rc::downgrade(&self.inner);
            }
        }
        self.wire(child);
        self.define_action(&setter, move |node, args| {
            if let Some(value) = args.first() {
                node.set_child(&name, value.clone());
            }
            Ok(node.get(&name).unwrap_or_default().into())
        })?;
        Ok(())
    }

    fn wire(&self, child: &Node) {
        let parent = Rc::downgrade(&self.inner);
        let source = child.inner.name.clone();
        child.inner.changes.listen(
            move |change: &ChangeRecord| {
                let Some(inner) = parent.upgrade() else {
                    return false;
                };
                let node = Node { inner };
                node.push_change(change.cascade(&source, &node.inner.name));
                true
            },
            None,
        );

        let parent = Rc::downgrade(&self.inner);
        let source = child.inner.name.clone();
        child.inner.errors.listen(
            move |record: &ErrorRecord| {
                let Some(inner) = parent.upgrade() else {
                    return false;
                };
                let node = Node { inner };
                let name = node.inner.name.as_str();
                node.push_error(ErrorRecord::cascade(record, &source, name, node.path(), name));
                true
            },
            None,
        );
    }

    // ---------- emission ----------

    fn push_change(&self, record: ChangeRecord) {
        if self.is_completed() {
            return;
        }
        tracing::trace!(
            node = %self.inner.name,
            name = %record.name,
            value = %record.value,
            "change"
        );
        self.inner.changes.next(&record);
        if self.transaction_count() == 0 {
            self.emit_current();
        }
    }

    fn push_error(&self, record: ErrorRecord) {
        if self.is_completed() {
            return;
        }
        self.inner.errors.next(&record);
    }

    fn emit_current(&self) {
        let value = self.value();
        self.inner.current.next(&value);
    }

    // ---------- transactions ----------

    /// Open transactions on this node, plus those mirrored from a projection source.
    pub fn transaction_count(&self) -> usize {
        self.inner.transactions.borrow().count() + self.inner.mirrored.get()
    }

    pub(crate) fn open_transaction(&self, name: &str, params: &[Value]) -> Rc<Transaction> {
        let id = self.inner.ctx.next_transaction_id();
        let path = self.path();
        let txn = self
            .inner
            .transactions
            .borrow_mut()
            .begin(id, name, params.to_vec(), path);
        tracing::debug!(node = %txn.target, id = %txn.id, action = name, "transaction opened");
        self.count_changed();
        txn
    }

    pub(crate) fn close_transaction(&self, txn: &Transaction) {
        let closed = self.inner.transactions.borrow_mut().close(txn);
        match closed {
            Ok(()) => {
                tracing::debug!(node = %txn.target, id = %txn.id, action = %txn.name, "transaction closed");
                self.count_changed();
            }
            Err(e) => tracing::debug!(node = %txn.target, error = %e, "close ignored"),
        }
    }

    /// Publish the count. Every return to zero emits the current value.
    pub(crate) fn count_changed(&self) {
        let count = self.transaction_count();
        self.inner.counts.next(&count);
        if count == 0 && !self.is_completed() {
            self.emit_current();
        }
    }

    // ---------- teardown ----------

    /// Close every channel of this node. Children are not completed.
    pub fn complete(&self) {
        if self.inner.completed.replace(true) {
            return;
        }
        tracing::debug!(node = %self.path(), "completed");
        self.inner.bus.borrow_mut().clear();
        self.inner.changes.complete();
        self.inner.errors.complete();
        self.inner.counts.complete();
        self.inner.current.complete();
    }
}

/// Equality for distinct filtering. Numbers compare by value, so `0` equals `0.0`.
fn same_scalar(current: &Value, next: &Value) -> bool {
    match (current.as_f64(), next.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => current == next,
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path())
            .field("value", &self.value())
            .field("transactions", &self.transaction_count())
            .finish()
    }
}
