//! A panicking observer must not lose work queued for other observers.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use tidemark_reactive::{ChangeDiff, ChangeOp, Notification, SubscriptionRegistry};

type Log = Rc<RefCell<Vec<Notification>>>;

fn recorder(log: &Log) -> impl Fn(&Notification) -> tidemark_reactive::ObserverResult + 'static {
    let log = log.clone();
    move |n: &Notification| {
        log.borrow_mut().push(n.clone());
        Ok(())
    }
}

fn panicking_on_delta(calls: &Rc<Cell<usize>>) -> impl Fn(&Notification) -> tidemark_reactive::ObserverResult + 'static {
    let calls = calls.clone();
    move |n: &Notification| {
        if !n.is_baseline() {
            calls.set(calls.get() + 1);
            panic!("observer bug");
        }
        Ok(())
    }
}

#[test]
fn other_collection_delta_survives_observer_panic() {
    let registry = SubscriptionRegistry::new();
    let calls = Rc::new(Cell::new(0));
    registry.subscribe(1, panicking_on_delta(&calls));
    let log: Log = Rc::default();
    registry.subscribe(2, recorder(&log));
    registry.flush();

    registry.enqueue(1, ChangeDiff::insertions(0, [0]).unwrap());
    registry.enqueue(2, ChangeDiff::insertions(3, [3]).unwrap());

    let result = catch_unwind(AssertUnwindSafe(|| registry.flush()));
    assert!(result.is_err());
    assert_eq!(log.borrow().len(), 1);
    assert!(registry.has_pending());
    assert!(registry.is_flush_scheduled());

    let summary = registry.flush();
    assert_eq!(summary.delivered, 1);
    assert_eq!(calls.get(), 1);

    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].collection, 2);
    assert_eq!(log[1].change.ops(), &[ChangeOp::add(3, 1)]);
}

#[test]
fn later_subscribers_of_same_transaction_survive_observer_panic() {
    let registry = SubscriptionRegistry::new();
    let calls = Rc::new(Cell::new(0));
    registry.subscribe(1, panicking_on_delta(&calls));
    let log: Log = Rc::default();
    registry.subscribe(1, recorder(&log));
    registry.flush();

    registry.enqueue(1, ChangeDiff::deletions(3, [0, 1]).unwrap());
    assert!(catch_unwind(AssertUnwindSafe(|| registry.flush())).is_err());

    registry.flush();
    assert_eq!(calls.get(), 1);
    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].change.ops(), &[ChangeOp::remove(0, 2)]);
    assert!(!registry.has_pending());
}

#[test]
fn scheduler_rearmed_after_observer_panic() {
    let registry = SubscriptionRegistry::new();
    let turns = Rc::new(Cell::new(0));
    let counter = turns.clone();
    registry.set_scheduler(move || counter.set(counter.get() + 1));

    let calls = Rc::new(Cell::new(0));
    registry.subscribe(1, panicking_on_delta(&calls));
    registry.subscribe(2, |_| Ok(()));
    registry.flush();
    assert_eq!(turns.get(), 1);

    registry.enqueue(1, ChangeDiff::insertions(0, [0]).unwrap());
    registry.enqueue(2, ChangeDiff::insertions(0, [0]).unwrap());
    assert_eq!(turns.get(), 2);

    assert!(catch_unwind(AssertUnwindSafe(|| registry.flush())).is_err());
    assert_eq!(turns.get(), 3);
}
