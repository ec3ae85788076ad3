//! Durable watch state + recipient lists with persistence.
//!
//! One JSON record at `.lurk/state.json` holds the active watch (if any) and
//! the recipient sets. It is the sole source of truth across restarts and is
//! written atomically on every mutation via [`crate::state::save_state`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// State of the single tracked thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchState {
    /// Source sub-forum identifier (opaque).
    pub board: String,

    /// Tracked thread identifier (opaque).
    pub thread_id: String,

    /// Highest post sequence number already notified. `None` only if the
    /// thread had no posts at `track` time. Monotonically non-decreasing.
    #[serde(default)]
    pub last_seen: Option<u64>,

    /// Total posts observed in the most recent snapshot.
    #[serde(default)]
    pub post_count: u32,

    /// Milestone thresholds already notified for this thread.
    #[serde(default)]
    pub fired_thresholds: BTreeSet<u32>,
}

/// Who gets notified: private recipients and shared channels.
///
/// Independent of the watch lifecycle — survives `track`/`untrack`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientSet {
    /// Recipient identifiers for private delivery.
    #[serde(default)]
    pub direct_recipients: BTreeSet<String>,

    /// Channel identifiers for shared delivery.
    #[serde(default)]
    pub broadcast_channels: BTreeSet<String>,
}

impl RecipientSet {
    /// Total number of delivery targets.
    pub fn len(&self) -> usize {
        self.direct_recipients.len() + self.broadcast_channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.direct_recipients.is_empty() && self.broadcast_channels.is_empty()
    }
}

/// The full persisted record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    /// Active watch, if a thread is being tracked.
    #[serde(default)]
    pub watch: Option<WatchState>,

    /// Recipient lists.
    #[serde(default)]
    pub recipients: RecipientSet,
}

/// Manages watch state and recipient lists with persistence to disk.
pub struct WatchStore {
    path: PathBuf,
    state: StoreState,
}

impl WatchStore {
    /// Load or create the store rooted at the given directory.
    ///
    /// A missing state file is a normal cold start; a present but unreadable
    /// one is logged and replaced with defaults on the next save.
    pub fn load(root: &Path) -> Self {
        let path = root.join(".lurk/state.json");
        let state: StoreState = match crate::state::load_state(&path) {
            Ok(state) => state,
            Err(e) => {
                if path.exists() {
                    eprintln!("[store] failed to load state: {e}");
                }
                StoreState::default()
            }
        };
        Self { path, state }
    }

    /// Persist current state to disk (atomic temp-then-rename).
    pub fn save(&self) -> color_eyre::Result<()> {
        crate::state::save_state(&self.path, &self.state)
    }

    /// The active watch, if any.
    pub fn watch(&self) -> Option<&WatchState> {
        self.state.watch.as_ref()
    }

    /// Start watching a thread, replacing any prior watch outright.
    ///
    /// `last_seen` is pre-set to the thread's current highest sequence so the
    /// first poll does not replay the whole backlog as new posts.
    pub fn start_watch(
        &mut self,
        board: String,
        thread_id: String,
        last_seen: Option<u64>,
        post_count: u32,
    ) {
        self.state.watch = Some(WatchState {
            board,
            thread_id,
            last_seen,
            post_count,
            fired_thresholds: BTreeSet::new(),
        });
    }

    /// Stop watching. Returns whether a watch was active.
    pub fn clear_watch(&mut self) -> bool {
        self.state.watch.take().is_some()
    }

    /// Advance the seen cursor and post count after a poll found new posts.
    pub fn record_seen(&mut self, last_seen: u64, post_count: u32) {
        if let Some(watch) = self.state.watch.as_mut() {
            watch.last_seen = Some(last_seen);
            watch.post_count = post_count;
        }
    }

    /// Mark a milestone threshold as notified.
    /// Returns `false` if it had already fired (never re-notify).
    pub fn mark_threshold(&mut self, threshold: u32) -> bool {
        match self.state.watch.as_mut() {
            Some(watch) => watch.fired_thresholds.insert(threshold),
            None => false,
        }
    }

    /// The recipient lists.
    pub fn recipients(&self) -> &RecipientSet {
        &self.state.recipients
    }

    /// Add a direct recipient. Returns whether the set changed.
    pub fn add_user(&mut self, id: impl Into<String>) -> bool {
        self.state.recipients.direct_recipients.insert(id.into())
    }

    /// Remove a direct recipient. Returns whether the set changed.
    pub fn remove_user(&mut self, id: &str) -> bool {
        self.state.recipients.direct_recipients.remove(id)
    }

    /// Add a broadcast channel. Returns whether the set changed.
    pub fn add_channel(&mut self, id: impl Into<String>) -> bool {
        self.state.recipients.broadcast_channels.insert(id.into())
    }

    /// Remove a broadcast channel. Returns whether the set changed.
    pub fn remove_channel(&mut self, id: &str) -> bool {
        self.state.recipients.broadcast_channels.remove(id)
    }
}
