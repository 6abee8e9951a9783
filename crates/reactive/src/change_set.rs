//! Classified change: the collection-changed event handed to observers.
//!
//! A classified change is either a reset (reread the whole collection) or an
//! ordered list of add/remove ranges, plus two derived flags for observers that
//! only care whether the count or the contents changed.

use alloc::vec::Vec;

/// Direction of a range operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Rows were inserted; `start_index` is in post-transaction space.
    Add,
    /// Rows were removed; `start_index` is in pre-transaction space.
    Remove,
}

/// A contiguous run of added or removed rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChangeOp {
    /// Direction
    pub kind: ChangeKind,
    /// First index of the run
    pub start_index: usize,
    /// Number of rows in the run
    pub count: usize,
}

impl ChangeOp {
    /// Creates an add operation.
    #[inline]
    pub fn add(start_index: usize, count: usize) -> Self {
        Self {
            kind: ChangeKind::Add,
            start_index,
            count,
        }
    }

    /// Creates a remove operation.
    #[inline]
    pub fn remove(start_index: usize, count: usize) -> Self {
        Self {
            kind: ChangeKind::Remove,
            start_index,
            count,
        }
    }
}

/// The shape of a classified change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeShape {
    /// Too complex to describe incrementally; observers reread everything.
    Reset,
    /// Precise operations in the order the collection's view changed.
    Ranges(Vec<ChangeOp>),
}

/// A transaction's change to one collection, as observers see it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedChange {
    /// Reset or precise ranges
    pub shape: ChangeShape,
    /// True if rows were inserted or deleted
    pub count_changed: bool,
    /// True if rows were modified in place
    pub content_changed: bool,
}

impl ClassifiedChange {
    /// Creates a reset change.
    pub fn reset(count_changed: bool, content_changed: bool) -> Self {
        Self {
            shape: ChangeShape::Reset,
            count_changed,
            content_changed,
        }
    }

    /// Creates a change described by precise operations.
    pub fn ranges(ops: Vec<ChangeOp>, count_changed: bool, content_changed: bool) -> Self {
        Self {
            shape: ChangeShape::Ranges(ops),
            count_changed,
            content_changed,
        }
    }

    /// The change delivered as a subscription's first notification.
    ///
    /// It carries no delta: observers read the collection as it is.
    pub fn baseline() -> Self {
        Self::reset(false, false)
    }

    /// Returns true if observers must reread the whole collection.
    #[inline]
    pub fn is_reset(&self) -> bool {
        matches!(self.shape, ChangeShape::Reset)
    }

    /// Returns the precise operations; empty for a reset.
    pub fn ops(&self) -> &[ChangeOp] {
        match &self.shape {
            ChangeShape::Reset => &[],
            ChangeShape::Ranges(ops) => ops,
        }
    }

    /// Returns the net change in collection length described by the operations,
    /// or `None` for a reset.
    pub fn len_delta(&self) -> Option<isize> {
        match &self.shape {
            ChangeShape::Reset => None,
            ChangeShape::Ranges(ops) => Some(ops.iter().fold(0isize, |acc, op| match op.kind {
                ChangeKind::Add => acc + op.count as isize,
                ChangeKind::Remove => acc - op.count as isize,
            })),
        }
    }
}
