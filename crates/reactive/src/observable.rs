//! Observed collection handle.
//!
//! An `ObservedCollection` stands for one query result or list property. It
//! holds only a weak reference to the registry; subscriptions are owned by the
//! registry and end when the token is unsubscribed or the handle that created
//! them is dropped. Several handles may share a collection id; each one only
//! ever removes its own subscriptions.

use crate::diff::{ChangeDiff, CollectionId};
use crate::registry::{SubscriptionRegistry, WeakRegistry};
use crate::subscription::{Notification, ObserverResult, SubscriptionToken};
use alloc::format;
use alloc::vec::Vec;
use core::cell::RefCell;
use tidemark_core::{Error, Result};

/// A collection whose committed changes are published to subscribers.
pub struct ObservedCollection {
    id: CollectionId,
    registry: WeakRegistry,
    /// Length after the last committed transaction
    len: usize,
    /// Subscriptions created through this handle
    tokens: RefCell<Vec<SubscriptionToken>>,
}

impl ObservedCollection {
    /// Creates a handle for a collection that currently has `len` rows.
    pub fn new(registry: &SubscriptionRegistry, id: CollectionId, len: usize) -> Self {
        Self {
            id,
            registry: registry.downgrade(),
            len,
            tokens: RefCell::new(Vec::new()),
        }
    }

    /// Returns the collection identifier.
    #[inline]
    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// Returns the collection length as of the last commit.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Subscribes to this collection. Returns `None` if the registry is gone.
    pub fn subscribe<F>(&self, callback: F) -> Option<SubscriptionToken>
    where
        F: Fn(&Notification) -> ObserverResult + 'static,
    {
        let registry = self.registry.upgrade()?;
        let token = registry.subscribe(self.id, callback);
        self.tokens.borrow_mut().push(token);
        Some(token)
    }

    /// Removes a subscription created through this handle.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut tokens = self.tokens.borrow_mut();
        let Some(position) = tokens.iter().position(|t| *t == token) else {
            return false;
        };
        tokens.swap_remove(position);
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.unsubscribe(token))
    }

    /// Returns the number of live subscriptions created through this handle.
    pub fn subscription_count(&self) -> usize {
        let Some(registry) = self.registry.upgrade() else {
            return 0;
        };
        self.tokens
            .borrow()
            .iter()
            .filter(|token| registry.is_live(**token))
            .count()
    }

    /// Publishes a committed transaction's diff.
    ///
    /// The diff must start from the length recorded by the previous commit.
    pub fn notify_committed(&mut self, diff: ChangeDiff) -> Result<()> {
        if diff.old_len() != self.len {
            return Err(Error::inconsistent_diff(format!(
                "collection {} has {} rows but the diff starts from {}",
                self.id,
                self.len,
                diff.old_len()
            )));
        }
        self.len = diff.new_len();
        if let Some(registry) = self.registry.upgrade() {
            registry.enqueue(self.id, diff);
        }
        Ok(())
    }
}

impl Drop for ObservedCollection {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        for token in self.tokens.get_mut().drain(..) {
            registry.unsubscribe(token);
        }
    }
}

impl core::fmt::Debug for ObservedCollection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObservedCollection")
            .field("id", &self.id)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
