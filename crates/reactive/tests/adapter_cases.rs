//! End-to-end notification scenarios: commit, flush, observe.

use std::cell::RefCell;
use std::rc::Rc;
use tidemark_reactive::{
    AdapterConfig, ChangeDiff, ChangeOp, MultiRunPolicy, Notification, NotificationKind,
    ObservedCollection, SubscriptionRegistry,
};

type Log = Rc<RefCell<Vec<Notification>>>;

fn observe(collection: &ObservedCollection) -> Log {
    let log: Log = Rc::default();
    let sink = log.clone();
    collection
        .subscribe(move |n| {
            sink.borrow_mut().push(n.clone());
            Ok(())
        })
        .expect("registry alive");
    log
}

/// Commits one diff and returns the single delta it produced.
fn commit_one(
    registry: &SubscriptionRegistry,
    collection: &mut ObservedCollection,
    log: &Log,
    diff: ChangeDiff,
) -> Notification {
    let before = log.borrow().len();
    collection.notify_committed(diff).unwrap();
    registry.flush();
    let log = log.borrow();
    assert_eq!(log.len(), before + 1, "expected exactly one notification");
    log[before].clone()
}

#[test]
fn add_into_empty_collection() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 0);
    let log = observe(&people);
    registry.flush();

    let n = commit_one(&registry, &mut people, &log, ChangeDiff::insertions(0, [0]).unwrap());
    assert_eq!(n.kind, NotificationKind::Delta);
    assert_eq!(n.change.ops(), &[ChangeOp::add(0, 1)]);
    assert!(n.change.count_changed);
}

#[test]
fn append_after_existing_rows() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 3);
    let log = observe(&people);
    registry.flush();

    let n = commit_one(&registry, &mut people, &log, ChangeDiff::insertions(3, [3]).unwrap());
    assert_eq!(n.change.ops(), &[ChangeOp::add(3, 1)]);
}

#[test]
fn remove_everything() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 3);
    let log = observe(&people);
    registry.flush();

    let n = commit_one(
        &registry,
        &mut people,
        &log,
        ChangeDiff::deletions(3, [0, 1, 2]).unwrap(),
    );
    assert_eq!(n.change.ops(), &[ChangeOp::remove(0, 3)]);
    assert!(people.is_empty());
}

#[test]
fn non_adjacent_removes_are_precise_by_default() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 5);
    let log = observe(&people);
    registry.flush();

    let n = commit_one(&registry, &mut people, &log, ChangeDiff::deletions(5, [2, 4]).unwrap());
    assert_eq!(
        n.change.ops(),
        &[ChangeOp::remove(2, 1), ChangeOp::remove(4, 1)]
    );
}

#[test]
fn non_adjacent_removes_reset_when_conservative() {
    let registry = SubscriptionRegistry::with_config(AdapterConfig {
        multi_run: MultiRunPolicy::Conservative,
    });
    let mut people = ObservedCollection::new(&registry, 1, 5);
    let log = observe(&people);
    registry.flush();

    let n = commit_one(&registry, &mut people, &log, ChangeDiff::deletions(5, [2, 4]).unwrap());
    assert!(n.change.is_reset());
    assert!(n.change.count_changed);
}

#[test]
fn add_and_remove_in_one_transaction_resets() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 3);
    let log = observe(&people);
    registry.flush();

    let n = commit_one(
        &registry,
        &mut people,
        &log,
        ChangeDiff::new(3, 3, [2], [0], []).unwrap(),
    );
    assert!(n.change.is_reset());
    assert!(n.change.count_changed);
    assert!(!n.change.content_changed);
}

#[test]
fn modification_only_changes_content() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 3);
    let log = observe(&people);
    registry.flush();

    let n = commit_one(
        &registry,
        &mut people,
        &log,
        ChangeDiff::modifications(3, [1]).unwrap(),
    );
    assert!(!n.change.is_reset());
    assert!(n.change.ops().is_empty());
    assert!(n.change.content_changed);
    assert!(!n.change.count_changed);
}

#[test]
fn empty_transaction_is_silent() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 3);
    let log = observe(&people);
    registry.flush();

    people
        .notify_committed(ChangeDiff::new(3, 3, [], [], []).unwrap())
        .unwrap();
    registry.flush();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn unsubscribe_then_write_delivers_nothing() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 0);
    let log: Log = Rc::default();
    let sink = log.clone();
    let token = people
        .subscribe(move |n| {
            sink.borrow_mut().push(n.clone());
            Ok(())
        })
        .unwrap();
    registry.flush();

    assert!(people.unsubscribe(token));
    people
        .notify_committed(ChangeDiff::insertions(0, [0]).unwrap())
        .unwrap();
    registry.flush();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn exactly_one_baseline_before_any_delta() {
    let registry = SubscriptionRegistry::new();
    let mut people = ObservedCollection::new(&registry, 1, 0);
    let log = observe(&people);

    people
        .notify_committed(ChangeDiff::insertions(0, [0]).unwrap())
        .unwrap();
    people
        .notify_committed(ChangeDiff::insertions(1, [1]).unwrap())
        .unwrap();
    registry.flush();
    registry.flush();

    let kinds: Vec<NotificationKind> = log.borrow().iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::Baseline,
            NotificationKind::Delta,
            NotificationKind::Delta
        ]
    );
}

#[test]
fn diff_out_of_range_is_rejected() {
    assert!(ChangeDiff::deletions(3, [3]).is_err());
    assert!(ChangeDiff::new(2, 2, [2], [0], []).is_err());
    assert!(ChangeDiff::new(2, 3, [], [], []).is_err());
}
