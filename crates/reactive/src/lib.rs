//! Tidemark Reactive - change classification and subscription dispatch.
//!
//! A write transaction produces, for every observed collection, a
//! [`ChangeDiff`]: the inserted, deleted and modified row indices. This crate
//! turns those diffs into [`ClassifiedChange`] events and delivers them to
//! subscribers on a later scheduling turn.
//!
//! # Core Concepts
//!
//! - `ChangeDiff`: validated raw index sets for one collection and one transaction
//! - `ChangeAdapter`: classifies a diff into add/remove runs or a reset
//! - `SubscriptionRegistry`: owns callbacks, queues commits, delivers on `flush`
//! - `on_commit`: database-wide listener called once per committed transaction
//! - `ObservedCollection`: per-collection handle that publishes commits
//!
//! # Example
//!
//! ```
//! use tidemark_reactive::{ChangeDiff, ChangeOp, ObservedCollection, SubscriptionRegistry};
//!
//! let registry = SubscriptionRegistry::new();
//! let mut people = ObservedCollection::new(&registry, 1, 3);
//!
//! people.subscribe(|notification| {
//!     if !notification.is_baseline() {
//!         assert_eq!(notification.change.ops(), &[ChangeOp::remove(0, 3)]);
//!     }
//!     Ok(())
//! });
//!
//! people.notify_committed(ChangeDiff::deletions(3, [0, 1, 2]).unwrap()).unwrap();
//! registry.flush();
//! ```

#![no_std]

extern crate alloc;

pub mod adapter;
pub mod change_set;
pub mod diff;
pub mod observable;
pub mod registry;
pub mod subscription;

pub use adapter::{contiguous_runs, AdapterConfig, ChangeAdapter, MultiRunPolicy};
pub use change_set::{ChangeKind, ChangeOp, ChangeShape, ClassifiedChange};
pub use diff::{ChangeDiff, CollectionId};
pub use observable::ObservedCollection;
pub use registry::{
    CommitListener, DispatchError, ErrorHandler, FlushSummary, Scheduler, SubscriptionRegistry,
    WeakRegistry,
};
pub use subscription::{
    ChangeCallback, Notification, NotificationKind, ObserverError, ObserverResult, Subscription,
    SubscriptionToken,
};
