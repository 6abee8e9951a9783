//! Change notification adapter.
//!
//! Turns one transaction's `(inserted, deleted, modified)` index sets into a
//! [`ClassifiedChange`]:
//!
//! 1. Nothing changed: no event.
//! 2. Rows were both inserted and deleted: a single reset. Add/remove ranges
//!    cannot describe "some rows left, others arrived" without offset math
//!    the observer would have to replay.
//! 3. Otherwise the one non-empty direction is split into maximal contiguous
//!    runs, one operation per run, in ascending index order. Every start
//!    index is absolute in its own index space (pre-transaction for removes,
//!    post-transaction for adds); it is not shifted by earlier operations.
//! 4. Modifications alone produce an empty operation list with
//!    `content_changed` set.
//!
//! Whether several non-adjacent runs in one direction are reported precisely
//! or collapsed into a reset is decided by [`MultiRunPolicy`].

use crate::change_set::{ChangeOp, ClassifiedChange};
use crate::diff::ChangeDiff;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;

/// How to report several non-adjacent runs in a single direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MultiRunPolicy {
    /// One operation per run.
    #[default]
    Precise,
    /// A reset whenever there is more than one run.
    Conservative,
}

/// Adapter configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Policy for multiple runs in one direction
    pub multi_run: MultiRunPolicy,
}

/// Classifies change diffs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChangeAdapter {
    config: AdapterConfig,
}

impl ChangeAdapter {
    /// Creates an adapter with the given configuration.
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }

    /// Returns the adapter configuration.
    #[inline]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Classifies a diff. Returns `None` if the diff is empty.
    pub fn classify(&self, diff: &ChangeDiff) -> Option<ClassifiedChange> {
        if diff.is_empty() {
            return None;
        }

        let count_changed = !diff.inserted().is_empty() || !diff.deleted().is_empty();
        let content_changed = !diff.modified().is_empty();

        if !diff.inserted().is_empty() && !diff.deleted().is_empty() {
            return Some(ClassifiedChange::reset(count_changed, content_changed));
        }

        let (indices, op): (_, fn(usize, usize) -> ChangeOp) = if !diff.inserted().is_empty() {
            (diff.inserted(), ChangeOp::add)
        } else {
            (diff.deleted(), ChangeOp::remove)
        };

        let runs = contiguous_runs(indices);
        if runs.len() > 1 && self.config.multi_run == MultiRunPolicy::Conservative {
            return Some(ClassifiedChange::reset(count_changed, content_changed));
        }

        let ops = runs
            .into_iter()
            .map(|(start, count)| op(start, count))
            .collect();
        Some(ClassifiedChange::ranges(ops, count_changed, content_changed))
    }
}

/// Splits sorted indices into maximal runs of consecutive values.
///
/// Returns `(start, count)` pairs in ascending order.
pub fn contiguous_runs(indices: &BTreeSet<usize>) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &index in indices {
        match runs.last_mut() {
            Some((start, count)) if *start + *count == index => *count += 1,
            _ => runs.push((index, 1)),
        }
    }
    runs
}
