//! Diff engine — computes what changed between a snapshot and prior state.
//!
//! A post is new iff its sequence number is above the persisted cursor. A
//! milestone threshold fires iff the snapshot's total post count reaches it
//! and it has not fired before. Both checks are pure; the caller persists
//! the resulting cursor/threshold updates.

use crate::fetch::{Item, Snapshot};
use crate::store::WatchState;

/// Fixed ascending set of milestone thresholds.
pub const THRESHOLDS: [u32; 2] = [450, 500];

/// Result of diffing one snapshot against the prior watch state.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// Posts not yet notified, in ascending sequence order.
    pub new_items: Vec<Item>,

    /// Thresholds newly crossed this poll, in ascending order.
    pub fired_thresholds: Vec<u32>,
}

/// Compute the new posts and newly fired thresholds for one poll.
pub fn diff(snapshot: &Snapshot, state: &WatchState) -> DiffResult {
    let new_items = snapshot
        .items
        .iter()
        .filter(|item| match state.last_seen {
            Some(cursor) => item.sequence > cursor,
            None => true,
        })
        .cloned()
        .collect();

    // Threshold checks use the total post count, independent of which posts
    // are new — a fired threshold never fires again.
    let fired_thresholds = THRESHOLDS
        .iter()
        .copied()
        .filter(|t| snapshot.post_count >= *t && !state.fired_thresholds.contains(t))
        .collect();

    DiffResult {
        new_items,
        fired_thresholds,
    }
}
