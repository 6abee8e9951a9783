//! Change diff for one observed collection and one write transaction.
//!
//! A diff carries three index sets. `deleted` indices refer to the collection
//! as it was before the transaction; `inserted` and `modified` refer to it
//! afterwards. The two index spaces are never mixed.

use alloc::collections::BTreeSet;
use alloc::format;
use tidemark_core::{Error, Result};

/// Unique identifier of an observed collection (a query result or a list property).
pub type CollectionId = u64;

/// The raw change to one collection produced by one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeDiff {
    /// Post-transaction indices of rows that became visible
    inserted: BTreeSet<usize>,
    /// Pre-transaction indices of rows that are no longer visible
    deleted: BTreeSet<usize>,
    /// Post-transaction indices of rows whose observed fields changed
    modified: BTreeSet<usize>,
    /// Collection length before the transaction
    old_len: usize,
    /// Collection length after the transaction
    new_len: usize,
}

impl ChangeDiff {
    /// Creates a diff, checking every index against its index space.
    ///
    /// An index outside the collection, or lengths that do not add up, mean the
    /// producer of the diff is broken; such diffs are rejected, never clamped.
    pub fn new<I, D, M>(
        old_len: usize,
        new_len: usize,
        inserted: I,
        deleted: D,
        modified: M,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
        D: IntoIterator<Item = usize>,
        M: IntoIterator<Item = usize>,
    {
        let diff = Self {
            inserted: inserted.into_iter().collect(),
            deleted: deleted.into_iter().collect(),
            modified: modified.into_iter().collect(),
            old_len,
            new_len,
        };
        diff.validate()?;
        Ok(diff)
    }

    /// Creates a diff with insertions only.
    pub fn insertions(old_len: usize, inserted: impl IntoIterator<Item = usize>) -> Result<Self> {
        let inserted: BTreeSet<usize> = inserted.into_iter().collect();
        let new_len = old_len + inserted.len();
        Self::new(old_len, new_len, inserted, [], [])
    }

    /// Creates a diff with deletions only.
    pub fn deletions(old_len: usize, deleted: impl IntoIterator<Item = usize>) -> Result<Self> {
        let deleted: BTreeSet<usize> = deleted.into_iter().collect();
        let new_len = old_len.checked_sub(deleted.len()).ok_or_else(|| {
            Error::inconsistent_diff(format!(
                "{} deletions from a collection of length {}",
                deleted.len(),
                old_len
            ))
        })?;
        Self::new(old_len, new_len, [], deleted, [])
    }

    /// Creates a diff with modifications only.
    pub fn modifications(len: usize, modified: impl IntoIterator<Item = usize>) -> Result<Self> {
        Self::new(len, len, [], [], modified)
    }

    fn validate(&self) -> Result<()> {
        check_bounds("deleted", &self.deleted, self.old_len)?;
        check_bounds("inserted", &self.inserted, self.new_len)?;
        check_bounds("modified", &self.modified, self.new_len)?;

        let expected = (self.old_len - self.deleted.len()) + self.inserted.len();
        if expected != self.new_len {
            return Err(Error::inconsistent_diff(format!(
                "old length {} - {} deleted + {} inserted != new length {}",
                self.old_len,
                self.deleted.len(),
                self.inserted.len(),
                self.new_len
            )));
        }
        Ok(())
    }

    /// Returns the inserted indices (post-transaction space).
    #[inline]
    pub fn inserted(&self) -> &BTreeSet<usize> {
        &self.inserted
    }

    /// Returns the deleted indices (pre-transaction space).
    #[inline]
    pub fn deleted(&self) -> &BTreeSet<usize> {
        &self.deleted
    }

    /// Returns the modified indices (post-transaction space).
    #[inline]
    pub fn modified(&self) -> &BTreeSet<usize> {
        &self.modified
    }

    /// Returns the collection length before the transaction.
    #[inline]
    pub fn old_len(&self) -> usize {
        self.old_len
    }

    /// Returns the collection length after the transaction.
    #[inline]
    pub fn new_len(&self) -> usize {
        self.new_len
    }

    /// Returns true if the transaction did not touch the collection.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }
}

fn check_bounds(set: &'static str, indices: &BTreeSet<usize>, len: usize) -> Result<()> {
    match indices.last() {
        Some(&index) if index >= len => Err(Error::IndexOutOfRange { set, index, len }),
        _ => Ok(()),
    }
}
