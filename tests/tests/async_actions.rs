//! Asynchronous action scenarios.
//!
//! Settlement is controlled with oneshot channels and the context pool is
//! driven explicitly between steps.

use arbor_tests::prelude::*;
use futures::channel::oneshot;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

type Slot<T> = Rc<RefCell<Option<T>>>;

fn slot<T>(value: T) -> Slot<T> {
    Rc::new(RefCell::new(Some(value)))
}

/// `coord` with a transactional `fetch` that moves x and y once `rx` yields.
fn coord_with_fetch(rx: oneshot::Receiver<i64>) -> Node {
    let ctx = Context::new();
    let coord = ctx.composite("coord").unwrap();
    coord
        .add_typed_child("x", 0, "number")
        .unwrap()
        .add_typed_child("y", 0, "number")
        .unwrap();

    let rx = slot(rx);
    coord
        .define_transactional("fetch", move |node, _| {
            // writes made before suspending are held back too
            node.set_child("x", -1);
            let rx = rx.borrow_mut().take();
            Ok(Outcome::pending(async move {
                let Some(rx) = rx else {
                    return Err(Fault::new("fetch already in flight"));
                };
                match rx.await {
                    Ok(n) => Ok(Outcome::call(move |node, _| {
                        node.set_child("x", n).set_child("y", n);
                        Ok(Value::from(n).into())
                    })),
                    Err(_) => Err(Fault::new("sender dropped")),
                }
            }))
        })
        .unwrap();
    coord
}

mod deferred {
    use super::*;
    use pretty_assertions::assert_eq;

    pub fn scenario(tx: oneshot::Sender<i64>, rx: oneshot::Receiver<i64>) -> Scenario {
        Scenario::new("deferred", &coord_with_fetch(rx))
            .step(
                "start",
                |node| {
                    let result = node.act("fetch", &[])?;
                    assert!(result.is_pending());
                    Ok(())
                },
                |e| e.silent(),
            )
            .step(
                "idle_turn",
                |node| {
                    node.context().run_until_stalled();
                    assert_eq!(node.transaction_count(), 1);
                    Ok(())
                },
                |e| e.silent(),
            )
            .step(
                "settle",
                move |node| {
                    tx.send(5)
                        .map_err(|_| HarnessError::step_failed("settle", "receiver gone"))?;
                    node.context().run_until_stalled();
                    Ok(())
                },
                |e| e.values(1).last(vmap! { "x" => 5, "y" => 5 }),
            )
    }

    #[test]
    fn test_async_transaction_defers_emission() {
        let (tx, rx) = oneshot::channel();
        scenario(tx, rx).run().unwrap();
    }
}

#[test]
fn test_pending_result_resolves_to_final_value() {
    // GIVEN a fetch in flight
    let (tx, rx) = oneshot::channel();
    let coord = coord_with_fetch(rx);
    let pending = coord.act("fetch", &[]).unwrap().pending().unwrap();
    assert!(pending.peek().is_none());

    // WHEN the value arrives and the handle is awaited
    tx.send(3).unwrap();
    let settled = coord.context().run_until(pending.clone()).unwrap();

    // THEN the unwound value is returned and the handle is settled
    assert_eq!(settled.value(), Some(&Value::Int(3)));
    assert_eq!(pending.peek().and_then(|r| r.value().cloned()), Some(Value::Int(3)));
    assert_eq!(coord.transaction_count(), 0);
}

#[test]
fn test_dropped_sender_fails_and_closes() {
    // GIVEN a fetch whose sender goes away
    let (tx, rx) = oneshot::channel::<i64>();
    let coord = coord_with_fetch(rx);
    let recorder = Recorder::attach(&coord);
    coord.act("fetch", &[]).unwrap();

    // WHEN the sender is dropped
    drop(tx);
    coord.context().run_until_stalled();

    // THEN the failure is reported, the transaction closed, and the
    // write made before suspending is released
    assert_eq!(
        recorder.error_messages(),
        vec!["action fetch failed: sender dropped"]
    );
    assert_eq!(coord.transaction_count(), 0);
    assert_eq!(recorder.last_value(), Some(vmap! { "x" => -1, "y" => 0 }));
}

#[test]
fn test_second_fetch_fails_synchronously_after_suspending() {
    let (_tx, rx) = oneshot::channel::<i64>();
    let coord = coord_with_fetch(rx);
    coord.act("fetch", &[]).unwrap();

    let second = coord.act("fetch", &[]).unwrap().pending().unwrap();
    let settled = coord.context().run_until(second).unwrap();

    assert_eq!(
        settled.error().map(|e| e.message().to_string()),
        Some("fetch already in flight".to_string())
    );
    // the first fetch is still holding its transaction
    assert_eq!(coord.transaction_count(), 1);
}

#[test]
fn test_post_rejection_cascades_to_root() {
    // GIVEN app.api with an asynchronous post that is rejected
    let ctx = Context::new();
    let app = ctx.composite("app").unwrap();
    let api = app.add_composite("api").unwrap();
    api.define_action("post", |_, args| {
        let body = args.first().cloned().unwrap_or_default();
        Ok(Outcome::pending(async move {
            Err::<Outcome, Fault>(Fault::with_data("offline", vmap! { "body" => body }))
        }))
    })
    .unwrap();
    let recorder = Recorder::attach(&app);

    // WHEN posted and the pool runs
    let result = api.act("post", &values!["hello"]).unwrap();
    ctx.run_until_stalled();

    // THEN the root sees the failure with its payload
    let record = recorder.last_error().unwrap();
    assert_eq!(record.trail(), vec!["app", "app.api"]);
    match &record.origin().error {
        ErrorDetail::Action(e) => {
            assert_eq!(e.action, "post");
            assert_eq!(e.params, values!["hello"]);
            assert_eq!(e.fault.data, Some(vmap! { "body" => "hello" }));
        }
        other => panic!("expected an action error, got {:?}", other),
    }
    let settled = result.pending().and_then(|p| p.peek()).unwrap();
    assert!(settled.error().is_some());
}

#[test]
fn test_chained_suspensions_unwind() {
    // GIVEN an action that suspends twice before producing a value
    let (first_tx, first_rx) = oneshot::channel::<i64>();
    let (second_tx, second_rx) = oneshot::channel::<i64>();
    let ctx = Context::new();
    let node = ctx.composite("node").unwrap();
    let channels = slot((first_rx, second_rx));
    node.define_transactional("twoStep", move |_, _| {
        let Some((first, second)) = channels.borrow_mut().take() else {
            return Err(Fault::new("used"));
        };
        Ok(Outcome::pending(async move {
            let a = first.await.unwrap_or(0);
            Ok::<Outcome, Fault>(Outcome::pending(async move {
                let b = second.await.unwrap_or(0);
                Ok::<Outcome, Fault>(Value::from(a + b).into())
            }))
        }))
    })
    .unwrap();

    // WHEN both halves arrive
    let pending = node.act("twoStep", &[]).unwrap().pending().unwrap();
    first_tx.send(2).unwrap();
    ctx.run_until_stalled();
    assert_eq!(node.transaction_count(), 1);
    second_tx.send(3).unwrap();
    ctx.run_until_stalled();

    // THEN the final value is the sum and the transaction is closed
    assert_eq!(pending.peek().and_then(|r| r.value().cloned()), Some(Value::Int(5)));
    assert_eq!(node.transaction_count(), 0);
}
