//! Subscriptions and the notifications delivered to them.

use crate::change_set::ClassifiedChange;
use crate::diff::CollectionId;
use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;
use thiserror::Error;

/// Handle returned by `subscribe`; tokens are never reused within a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(pub(crate) u64);

impl SubscriptionToken {
    /// Returns the raw token value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Error raised by an observer callback.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("observer failed: {message}")]
pub struct ObserverError {
    message: String,
}

impl ObserverError {
    /// Creates an observer error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result returned by observer callbacks.
pub type ObserverResult = core::result::Result<(), ObserverError>;

/// Callback type for change notifications.
pub type ChangeCallback = Rc<dyn Fn(&Notification) -> ObserverResult>;

/// Why a notification was delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    /// First notification after subscribing; describes state at subscribe time.
    Baseline,
    /// A committed transaction changed the collection.
    Delta,
}

/// A notification handed to an observer.
#[derive(Clone, Debug)]
pub struct Notification {
    /// The collection that changed
    pub collection: CollectionId,
    /// Baseline or delta
    pub kind: NotificationKind,
    /// The classified change, shared by every subscriber of this delivery
    pub change: Rc<ClassifiedChange>,
}

impl Notification {
    /// Returns true for the baseline notification.
    #[inline]
    pub fn is_baseline(&self) -> bool {
        self.kind == NotificationKind::Baseline
    }
}

/// A registered callback for one collection.
#[derive(Clone)]
pub struct Subscription {
    token: SubscriptionToken,
    collection: CollectionId,
    /// Commit sequence at subscribe time; only later commits are delivered.
    subscribed_at: u64,
    callback: ChangeCallback,
}

impl Subscription {
    pub(crate) fn new(
        token: SubscriptionToken,
        collection: CollectionId,
        subscribed_at: u64,
        callback: ChangeCallback,
    ) -> Self {
        Self {
            token,
            collection,
            subscribed_at,
            callback,
        }
    }

    /// Returns the subscription token.
    #[inline]
    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    /// Returns the observed collection.
    #[inline]
    pub fn collection(&self) -> CollectionId {
        self.collection
    }

    /// Returns the commit sequence recorded at subscribe time.
    #[inline]
    pub fn subscribed_at(&self) -> u64 {
        self.subscribed_at
    }

    /// Returns true if a transaction committed at `seq` should reach this subscription.
    #[inline]
    pub fn observes(&self, seq: u64) -> bool {
        seq >= self.subscribed_at
    }

    pub(crate) fn callback(&self) -> ChangeCallback {
        self.callback.clone()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("collection", &self.collection)
            .field("subscribed_at", &self.subscribed_at)
            .finish_non_exhaustive()
    }
}
