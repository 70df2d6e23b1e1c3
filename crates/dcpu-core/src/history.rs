//! Bounded retention of prior machine states for rewind tooling.

use std::collections::VecDeque;

/// A retained state tagged with the retired-instruction count it was taken at.
#[derive(Debug, Clone)]
pub struct Snapshot<S> {
    /// Instructions retired when the snapshot was taken.
    pub step: u64,
    /// The retained state.
    pub state: S,
}

/// Ring of at most `capacity` snapshots, oldest evicted first.
///
/// With [`crate::PersistentState`] each entry shares all unchanged memory
/// with its neighbours.
#[derive(Debug, Clone)]
pub struct SnapshotHistory<S> {
    capacity: usize,
    entries: VecDeque<Snapshot<S>>,
}

impl<S> SnapshotHistory<S> {
    /// Creates an empty history; a capacity of 0 retains nothing.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Maximum number of retained snapshots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retains `state`, evicting the oldest snapshot when full.
    pub fn record(&mut self, step: u64, state: S) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Snapshot { step, state });
    }

    /// Most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&Snapshot<S>> {
        self.entries.back()
    }

    /// Latest snapshot taken at or before `step`.
    #[must_use]
    pub fn at_or_before(&self, step: u64) -> Option<&Snapshot<S>> {
        self.entries.iter().rev().find(|snapshot| snapshot.step <= step)
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot<S>> {
        self.entries.iter()
    }

    /// Drops every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops snapshots taken after `step`, used after rewinding.
    pub fn truncate_after(&mut self, step: u64) {
        while self.entries.back().is_some_and(|snapshot| snapshot.step > step) {
            self.entries.pop_back();
        }
    }
}
