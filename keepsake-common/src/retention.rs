//! Retention policy and rotation planning.
//!
//! The policy is a single positive count K: after a successful rotation a
//! backup folder holds at most the K most recent objects, counted by the
//! store's own newest-first listing order. Planning is a pure partition of
//! one listing, kept separate from the store calls so the rule itself is
//! testable without any network.

use crate::error::BackupError;
use crate::store::RemoteObject;

/// How many of the most recent objects a backup folder retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_count: usize,
}

impl RetentionPolicy {
    /// Retention used when the configuration does not override it.
    pub const DEFAULT_MAX_COUNT: i64 = 4;

    /// Build a policy that keeps the `max_count` most recent objects.
    ///
    /// `max_count` must be positive. Zero is rejected rather than read as
    /// "delete everything", and negative values are plain input errors;
    /// both fail here, before any listing or deletion can happen.
    pub fn new(max_count: i64) -> Result<Self, BackupError> {
        if max_count <= 0 {
            return Err(BackupError::Config(format!(
                "retention count must be positive, got {max_count}"
            )));
        }
        Ok(Self {
            max_count: max_count as usize,
        })
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Partition a newest-first listing into objects to keep and objects
    /// to prune.
    ///
    /// The input order is trusted as-is: the store contract delivers
    /// entries most-recent-first by creation time, and no local re-sort is
    /// applied — if the store stops honoring that order, rotation
    /// correctness degrades with it. The first `max_count` entries are
    /// kept; everything after them is pruned, preserving relative order in
    /// both halves.
    pub fn plan(&self, listing: Vec<RemoteObject>) -> RotationPlan {
        let mut keep = listing;
        let prune = if keep.len() > self.max_count {
            keep.split_off(self.max_count)
        } else {
            Vec::new()
        };
        RotationPlan { keep, prune }
    }
}

/// Outcome of applying a [`RetentionPolicy`] to one folder listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPlan {
    /// The newest objects, left untouched.
    pub keep: Vec<RemoteObject>,
    /// Everything older than the keep set, deleted one object at a time.
    pub prune: Vec<RemoteObject>,
}
