//! Subscription registry and the scheduling turn.
//!
//! Writes never deliver notifications synchronously. `commit` records a
//! committed transaction and asks the scheduler for a turn; `flush` is that
//! turn. Within a turn, pending baselines go out first, then transactions in
//! commit order, then commit events. Each transaction is classified once and
//! the same [`ClassifiedChange`] is shared by every subscriber that receives it.
//!
//! Liveness is checked per delivery, so a token unsubscribed before (or
//! during) a turn is never called again, even for transactions that were
//! already queued.
//!
//! Work is taken from the queues one delivery at a time. If an observer
//! panics, the panic propagates out of `flush`, but everything not yet
//! delivered stays queued and another turn is requested.

use crate::adapter::{AdapterConfig, ChangeAdapter};
use crate::change_set::ClassifiedChange;
use crate::diff::{ChangeDiff, CollectionId};
use crate::subscription::{
    ChangeCallback, Notification, NotificationKind, ObserverError, ObserverResult, Subscription,
    SubscriptionToken,
};
use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashMap;

/// Hook asked to run [`SubscriptionRegistry::flush`] on a later turn.
pub type Scheduler = Rc<dyn Fn()>;

/// Handler for errors raised by observer callbacks.
pub type ErrorHandler = Rc<dyn Fn(&DispatchError)>;

/// Listener called once per committed transaction with its sequence number.
pub type CommitListener = Rc<dyn Fn(u64)>;

/// An observer callback failed while a notification was delivered to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchError {
    /// The failing subscription
    pub token: SubscriptionToken,
    /// The collection the notification was for
    pub collection: CollectionId,
    /// Baseline or delta
    pub kind: NotificationKind,
    /// The error returned by the callback
    pub error: ObserverError,
}

/// Outcome of one scheduling turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Callbacks invoked, including those that failed
    pub delivered: usize,
    /// Transactions that produced no delivery (empty diff or no live observer)
    pub skipped: usize,
    /// Callbacks that returned an error
    pub errors: usize,
    /// Commit listener calls
    pub commits: usize,
}

struct PendingTransaction {
    seq: u64,
    collection: CollectionId,
    diff: ChangeDiff,
}

/// A classified transaction whose subscribers are still being called.
struct InFlight {
    collection: CollectionId,
    change: Rc<ClassifiedChange>,
    targets: VecDeque<SubscriptionToken>,
    delivered: bool,
}

struct PendingCommit {
    seq: u64,
    next_listener: usize,
}

/// Work queued before this point belongs to the current turn.
#[derive(Clone, Copy)]
struct TurnBoundary {
    token: u64,
    seq: u64,
}

struct RegistryState {
    adapter: ChangeAdapter,
    subscriptions: HashMap<SubscriptionToken, Subscription>,
    /// Collection -> tokens in subscription order
    by_collection: HashMap<CollectionId, Vec<SubscriptionToken>>,
    pending_baselines: VecDeque<SubscriptionToken>,
    pending: VecDeque<PendingTransaction>,
    in_flight: Option<InFlight>,
    pending_commits: VecDeque<PendingCommit>,
    next_token: u64,
    /// Sequence number the next committed transaction will get
    next_seq: u64,
    flush_scheduled: bool,
    scheduler: Option<Scheduler>,
    error_handlers: Vec<ErrorHandler>,
    commit_listeners: Vec<CommitListener>,
}

impl RegistryState {
    fn new(adapter: ChangeAdapter) -> Self {
        Self {
            adapter,
            subscriptions: HashMap::new(),
            by_collection: HashMap::new(),
            pending_baselines: VecDeque::new(),
            pending: VecDeque::new(),
            in_flight: None,
            pending_commits: VecDeque::new(),
            next_token: 1,
            next_seq: 0,
            flush_scheduled: false,
            scheduler: None,
            error_handlers: Vec::new(),
            commit_listeners: Vec::new(),
        }
    }

    /// Marks a turn as needed. Returns the scheduler to call, if this is the
    /// first request since the last flush.
    fn request_turn(&mut self) -> Option<Scheduler> {
        if self.flush_scheduled {
            return None;
        }
        self.flush_scheduled = true;
        self.scheduler.clone()
    }

    fn has_work(&self) -> bool {
        !self.pending_baselines.is_empty()
            || !self.pending.is_empty()
            || self.in_flight.is_some()
            || !self.pending_commits.is_empty()
    }

    fn boundary(&self) -> TurnBoundary {
        TurnBoundary {
            token: self.next_token,
            seq: self.next_seq,
        }
    }

    fn next_baseline(
        &mut self,
        boundary: TurnBoundary,
    ) -> Option<(SubscriptionToken, CollectionId, ChangeCallback)> {
        while let Some(&token) = self.pending_baselines.front() {
            if token.0 >= boundary.token {
                return None;
            }
            self.pending_baselines.pop_front();
            if let Some(sub) = self.subscriptions.get(&token) {
                return Some((token, sub.collection(), sub.callback()));
            }
        }
        None
    }

    fn next_delta(
        &mut self,
        boundary: TurnBoundary,
        summary: &mut FlushSummary,
    ) -> Option<(SubscriptionToken, Notification, ChangeCallback)> {
        loop {
            if let Some(in_flight) = self.in_flight.as_mut() {
                while let Some(token) = in_flight.targets.pop_front() {
                    if let Some(sub) = self.subscriptions.get(&token) {
                        in_flight.delivered = true;
                        let notification = Notification {
                            collection: in_flight.collection,
                            kind: NotificationKind::Delta,
                            change: in_flight.change.clone(),
                        };
                        return Some((token, notification, sub.callback()));
                    }
                }
                if !in_flight.delivered {
                    summary.skipped += 1;
                }
                self.in_flight = None;
            }

            if self.pending.front()?.seq >= boundary.seq {
                return None;
            }
            let tx = self.pending.pop_front()?;
            let targets: VecDeque<SubscriptionToken> = self
                .by_collection
                .get(&tx.collection)
                .map(|tokens| {
                    tokens
                        .iter()
                        .copied()
                        .filter(|token| {
                            self.subscriptions
                                .get(token)
                                .is_some_and(|sub| sub.observes(tx.seq))
                        })
                        .collect()
                })
                .unwrap_or_default();
            if targets.is_empty() {
                summary.skipped += 1;
                continue;
            }
            let Some(change) = self.adapter.classify(&tx.diff) else {
                summary.skipped += 1;
                continue;
            };
            self.in_flight = Some(InFlight {
                collection: tx.collection,
                change: Rc::new(change),
                targets,
                delivered: false,
            });
        }
    }

    fn next_commit(&mut self, boundary: TurnBoundary) -> Option<(u64, CommitListener)> {
        loop {
            let commit = self.pending_commits.front_mut()?;
            if commit.seq >= boundary.seq {
                return None;
            }
            match self.commit_listeners.get(commit.next_listener) {
                Some(listener) => {
                    commit.next_listener += 1;
                    return Some((commit.seq, listener.clone()));
                }
                None => {
                    self.pending_commits.pop_front();
                }
            }
        }
    }
}

/// Requests another turn if work is left when a turn ends, including when an
/// observer panicked part-way through.
struct TurnGuard<'a> {
    inner: &'a RefCell<RegistryState>,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let scheduler = match self.inner.try_borrow_mut() {
            Ok(mut state) if state.has_work() => state.request_turn(),
            _ => None,
        };
        if let Some(schedule) = scheduler {
            schedule();
        }
    }
}

/// Tracks subscriptions per collection and delivers classified changes.
///
/// The registry is confined to the context that created it; clones share
/// the same state.
///
/// # Example
///
/// ```
/// use tidemark_reactive::{ChangeDiff, SubscriptionRegistry};
///
/// let registry = SubscriptionRegistry::new();
/// let token = registry.subscribe(1, |notification| {
///     let _ = notification.change.ops();
///     Ok(())
/// });
///
/// registry.enqueue(1, ChangeDiff::insertions(0, [0]).unwrap());
/// let summary = registry.flush();
/// assert_eq!(summary.delivered, 2); // baseline + delta
/// assert!(registry.unsubscribe(token));
/// ```
#[derive(Clone)]
pub struct SubscriptionRegistry {
    inner: Rc<RefCell<RegistryState>>,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionRegistry {
    /// Creates a registry with the default adapter configuration.
    pub fn new() -> Self {
        Self::with_config(AdapterConfig::default())
    }

    /// Creates a registry whose adapter uses the given configuration.
    pub fn with_config(config: AdapterConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryState::new(ChangeAdapter::new(config)))),
        }
    }

    /// Returns the adapter configuration.
    pub fn adapter_config(&self) -> AdapterConfig {
        *self.inner.borrow().adapter.config()
    }

    /// Sets the hook called when a turn needs scheduling.
    ///
    /// The hook is called at most once between two flushes and must arrange
    /// for `flush` to run later; it must not flush synchronously.
    pub fn set_scheduler<F>(&self, scheduler: F)
    where
        F: Fn() + 'static,
    {
        self.inner.borrow_mut().scheduler = Some(Rc::new(scheduler));
    }

    /// Registers a handler for observer errors.
    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(&DispatchError) + 'static,
    {
        self.inner.borrow_mut().error_handlers.push(Rc::new(handler));
    }

    /// Registers a listener for every committed transaction, observed or not.
    ///
    /// The listener receives the commit's sequence number on the next turn.
    /// Commits made before it was registered are not reported.
    pub fn on_commit<F>(&self, listener: F)
    where
        F: Fn(u64) + 'static,
    {
        self.inner.borrow_mut().commit_listeners.push(Rc::new(listener));
    }

    /// Subscribes to a collection.
    ///
    /// The callback is not invoked now; its baseline notification is delivered
    /// on the next turn, before any delta.
    pub fn subscribe<F>(&self, collection: CollectionId, callback: F) -> SubscriptionToken
    where
        F: Fn(&Notification) -> ObserverResult + 'static,
    {
        let (token, scheduler) = {
            let mut state = self.inner.borrow_mut();
            let token = SubscriptionToken(state.next_token);
            state.next_token += 1;

            let subscribed_at = state.next_seq;
            state.subscriptions.insert(
                token,
                Subscription::new(token, collection, subscribed_at, Rc::new(callback)),
            );
            state.by_collection.entry(collection).or_default().push(token);
            state.pending_baselines.push_back(token);
            (token, state.request_turn())
        };
        if let Some(schedule) = scheduler {
            schedule();
        }
        token
    }

    /// Removes a subscription. Returns true if it was live.
    ///
    /// Idempotent. Once this returns the callback is never invoked again.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut state = self.inner.borrow_mut();
        let Some(sub) = state.subscriptions.remove(&token) else {
            return false;
        };
        let collection = sub.collection();
        let now_empty = match state.by_collection.get_mut(&collection) {
            Some(tokens) => {
                tokens.retain(|t| *t != token);
                tokens.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.by_collection.remove(&collection);
        }
        true
    }

    /// Removes every subscription on a collection and drops its queued
    /// transactions. Returns the number of subscriptions removed.
    pub fn remove_collection(&self, collection: CollectionId) -> usize {
        let mut state = self.inner.borrow_mut();
        let tokens = state.by_collection.remove(&collection).unwrap_or_default();
        for token in &tokens {
            state.subscriptions.remove(token);
        }
        state.pending.retain(|tx| tx.collection != collection);
        if state
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.collection == collection)
        {
            state.in_flight = None;
        }
        tokens.len()
    }

    /// Records one committed transaction and the diffs it produced.
    ///
    /// Every diff in the batch shares the transaction's sequence number, which
    /// is returned. Nothing is delivered here; delivery happens on the next
    /// `flush`. Diffs for collections nobody observes are dropped.
    pub fn commit<I>(&self, changes: I) -> u64
    where
        I: IntoIterator<Item = (CollectionId, ChangeDiff)>,
    {
        let changes: Vec<(CollectionId, ChangeDiff)> = changes.into_iter().collect();
        let (seq, scheduler) = {
            let mut state = self.inner.borrow_mut();
            let seq = state.next_seq;
            state.next_seq += 1;

            let mut queued = false;
            for (collection, diff) in changes {
                if state.by_collection.contains_key(&collection) {
                    state.pending.push_back(PendingTransaction {
                        seq,
                        collection,
                        diff,
                    });
                    queued = true;
                }
            }
            if !state.commit_listeners.is_empty() {
                state.pending_commits.push_back(PendingCommit {
                    seq,
                    next_listener: 0,
                });
                queued = true;
            }
            (seq, if queued { state.request_turn() } else { None })
        };
        if let Some(schedule) = scheduler {
            schedule();
        }
        seq
    }

    /// Records a committed transaction that changed a single collection.
    pub fn enqueue(&self, collection: CollectionId, diff: ChangeDiff) -> u64 {
        self.commit([(collection, diff)])
    }

    /// Runs one scheduling turn.
    ///
    /// Work queued by callbacks during the turn is left for the next one.
    pub fn flush(&self) -> FlushSummary {
        let boundary = {
            let mut state = self.inner.borrow_mut();
            state.flush_scheduled = false;
            state.boundary()
        };
        let _guard = TurnGuard { inner: &self.inner };
        let mut summary = FlushSummary::default();

        let baseline = Rc::new(ClassifiedChange::baseline());
        loop {
            let next = self.inner.borrow_mut().next_baseline(boundary);
            let Some((token, collection, callback)) = next else {
                break;
            };
            let notification = Notification {
                collection,
                kind: NotificationKind::Baseline,
                change: baseline.clone(),
            };
            self.deliver(token, &notification, &callback, &mut summary);
        }

        loop {
            let next = self.inner.borrow_mut().next_delta(boundary, &mut summary);
            let Some((token, notification, callback)) = next else {
                break;
            };
            self.deliver(token, &notification, &callback, &mut summary);
        }

        loop {
            let next = self.inner.borrow_mut().next_commit(boundary);
            let Some((seq, listener)) = next else {
                break;
            };
            summary.commits += 1;
            listener(seq);
        }

        tracing::trace!(
            delivered = summary.delivered,
            skipped = summary.skipped,
            errors = summary.errors,
            commits = summary.commits,
            "notification turn flushed"
        );
        summary
    }

    fn deliver(
        &self,
        token: SubscriptionToken,
        notification: &Notification,
        callback: &ChangeCallback,
        summary: &mut FlushSummary,
    ) {
        summary.delivered += 1;
        if let Err(error) = callback(notification) {
            summary.errors += 1;
            self.report(DispatchError {
                token,
                collection: notification.collection,
                kind: notification.kind,
                error,
            });
        }
    }

    fn report(&self, error: DispatchError) {
        let handlers = self.inner.borrow().error_handlers.clone();
        if handlers.is_empty() {
            tracing::error!(
                token = error.token.get(),
                collection = error.collection,
                error = %error.error,
                "observer callback failed"
            );
            return;
        }
        for handler in handlers {
            handler(&error);
        }
    }

    /// Returns the number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    /// Returns the number of live subscriptions on a collection.
    pub fn subscriptions_for(&self, collection: CollectionId) -> usize {
        self.inner
            .borrow()
            .by_collection
            .get(&collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Returns true if a subscription is live.
    pub fn is_live(&self, token: SubscriptionToken) -> bool {
        self.inner.borrow().subscriptions.contains_key(&token)
    }

    /// Returns true if baselines, transactions or commit events await a turn.
    pub fn has_pending(&self) -> bool {
        self.inner.borrow().has_work()
    }

    /// Returns true if a turn has been requested and not yet run.
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner.borrow().flush_scheduled
    }

    /// Creates a non-owning handle to this registry.
    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle to a [`SubscriptionRegistry`].
#[derive(Clone, Default)]
pub struct WeakRegistry {
    inner: Weak<RefCell<RegistryState>>,
}

impl WeakRegistry {
    /// Returns the registry if it is still alive.
    pub fn upgrade(&self) -> Option<SubscriptionRegistry> {
        self.inner
            .upgrade()
            .map(|inner| SubscriptionRegistry { inner })
    }
}
