//! The watch loop — orchestrates one poll cycle on a fixed timer.
//!
//! Owns the [`WatchStore`], the snapshot fetcher, and the notifier, plus the
//! single-slot last-notification cache used by `repost`. Each tick runs
//! fetch → diff → persist → format+dispatch. Persisting *before* dispatching
//! is mandatory: a crash after persist costs at most a missed notification,
//! whereas dispatch-before-persist would duplicate notifications on restart.

use color_eyre::Result;
use tokio_util::sync::CancellationToken;

use crate::diff;
use crate::dispatch::{self, Notifier};
use crate::fetch::{FetchError, SnapshotFetch};
use crate::format;
use crate::notify::{NotificationPayload, Severity};
use crate::store::WatchStore;

/// Out-of-band events surfaced to subscribers alongside post notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventKind {
    /// The watcher process (re)started.
    Restarted,

    /// Tracking began for a new thread.
    TrackStarted,

    /// A poll failed transiently; the watch continues.
    FetchFailed,

    /// The tracked thread is gone; the watch was stopped.
    ThreadGone,
}

impl SystemEventKind {
    fn title(self) -> &'static str {
        match self {
            Self::Restarted => "Watcher restarted",
            Self::TrackStarted => "Thread tracking started",
            Self::FetchFailed => "Thread fetch failed",
            Self::ThreadGone => "Thread no longer available",
        }
    }

    fn severity(self) -> Severity {
        match self {
            Self::Restarted | Self::TrackStarted => Severity::Info,
            Self::FetchFailed => Severity::Warning,
            Self::ThreadGone => Severity::Critical,
        }
    }
}

/// Snapshot of the watcher's condition, for the command layer.
#[derive(Debug, Clone, Default)]
pub struct Status {
    pub is_tracking: bool,
    pub board: Option<String>,
    pub thread_id: Option<String>,
    pub last_seen: Option<u64>,
    pub post_count: u32,
}

/// Watches one thread and fans notifications out to subscribers.
pub struct Watcher {
    store: WatchStore,
    fetcher: Box<dyn SnapshotFetch>,
    notifier: Box<dyn Notifier>,
    /// Most recently dispatched post notification. Serves `repost` only;
    /// deliberately not durable across restarts.
    last_notification: Option<NotificationPayload>,
}

impl Watcher {
    pub fn new(store: WatchStore, fetcher: Box<dyn SnapshotFetch>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            store,
            fetcher,
            notifier,
            last_notification: None,
        }
    }

    /// Read access to the underlying store (status display, tests).
    pub fn store(&self) -> &WatchStore {
        &self.store
    }

    /// Start tracking a thread, replacing any existing watch outright.
    ///
    /// Performs an initial fetch and pre-sets the seen cursor to the thread's
    /// current highest sequence — tracking starts "from now", the backlog is
    /// never replayed as new posts.
    pub async fn track(&mut self, board: &str, thread_id: &str) -> Result<()> {
        let snapshot = self
            .fetcher
            .fetch(board, thread_id)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("cannot track {board}/{thread_id}: {e}"))?;

        self.store.start_watch(
            board.to_string(),
            thread_id.to_string(),
            snapshot.last_sequence(),
            snapshot.post_count,
        );
        self.store.save()?;

        eprintln!(
            "[watch] tracking /{board}/ thread {thread_id} from post {:?} ({} posts)",
            snapshot.last_sequence(),
            snapshot.post_count
        );
        self.system_event(
            SystemEventKind::TrackStarted,
            format!("Now tracking /{board}/ thread {thread_id}."),
        )
        .await;
        Ok(())
    }

    /// Stop tracking. Returns whether a watch was active.
    pub fn untrack(&mut self) -> Result<bool> {
        let was_tracking = self.store.clear_watch();
        if was_tracking {
            self.store.save()?;
            eprintln!("[watch] stopped tracking");
        }
        Ok(was_tracking)
    }

    /// Add a direct recipient. Returns whether the set changed.
    pub fn add_user(&mut self, id: &str) -> Result<bool> {
        let changed = self.store.add_user(id);
        if changed {
            self.store.save()?;
        }
        Ok(changed)
    }

    /// Remove a direct recipient. Returns whether the set changed.
    pub fn remove_user(&mut self, id: &str) -> Result<bool> {
        let changed = self.store.remove_user(id);
        if changed {
            self.store.save()?;
        }
        Ok(changed)
    }

    /// Add a broadcast channel. Returns whether the set changed.
    pub fn add_channel(&mut self, id: &str) -> Result<bool> {
        let changed = self.store.add_channel(id);
        if changed {
            self.store.save()?;
        }
        Ok(changed)
    }

    /// Remove a broadcast channel. Returns whether the set changed.
    pub fn remove_channel(&mut self, id: &str) -> Result<bool> {
        let changed = self.store.remove_channel(id);
        if changed {
            self.store.save()?;
        }
        Ok(changed)
    }

    /// Current watcher condition.
    pub fn status(&self) -> Status {
        match self.store.watch() {
            Some(watch) => Status {
                is_tracking: true,
                board: Some(watch.board.clone()),
                thread_id: Some(watch.thread_id.clone()),
                last_seen: watch.last_seen,
                post_count: watch.post_count,
            },
            None => Status::default(),
        }
    }

    /// The most recently dispatched post notification, if any.
    pub fn repost_last(&self) -> Option<&NotificationPayload> {
        self.last_notification.as_ref()
    }

    /// Re-dispatch the cached last notification. Returns whether one existed.
    pub async fn repost(&self) -> bool {
        match &self.last_notification {
            Some(payload) => {
                dispatch::dispatch(self.notifier.as_ref(), payload, self.store.recipients()).await;
                true
            }
            None => false,
        }
    }

    /// Build and dispatch a system notice to all subscribers.
    pub async fn system_event(&self, kind: SystemEventKind, detail: impl Into<String>) {
        let payload = NotificationPayload::new(kind.severity(), kind.title(), detail.into());
        dispatch::dispatch(self.notifier.as_ref(), &payload, self.store.recipients()).await;
    }

    /// Run one poll cycle. A no-op when nothing is tracked.
    ///
    /// Errors returned here are persistence failures — the tick aborted
    /// before dispatching anything for the un-persisted state. Fetch errors
    /// never propagate; they surface as system notices per their kind.
    pub async fn tick(&mut self) -> Result<()> {
        let Some(watch) = self.store.watch().cloned() else {
            return Ok(());
        };
        let board = watch.board.clone();
        let thread_id = watch.thread_id.clone();

        let snapshot = match self.fetcher.fetch(&board, &thread_id).await {
            Ok(snapshot) => snapshot,
            Err(FetchError::NotFound) => {
                // Terminal for this thread: stop the watch, tell subscribers.
                eprintln!("[watch] /{board}/ thread {thread_id} is gone, untracking");
                self.store.clear_watch();
                self.store.save()?;
                self.system_event(
                    SystemEventKind::ThreadGone,
                    format!("/{board}/ thread {thread_id} was deleted or pruned. Tracking stopped."),
                )
                .await;
                return Ok(());
            }
            Err(e) => {
                if let FetchError::Malformed(detail) = &e {
                    eprintln!("[watch] malformed snapshot for /{board}/ {thread_id}: {detail}");
                }
                self.system_event(
                    SystemEventKind::FetchFailed,
                    format!("Could not fetch /{board}/ thread {thread_id}: {e}. Will retry."),
                )
                .await;
                return Ok(());
            }
        };

        let changes = diff::diff(&snapshot, &watch);

        if let Some(newest) = changes.new_items.last() {
            // Persist the advanced cursor before any dispatch.
            self.store.record_seen(newest.sequence, snapshot.post_count);
            self.store.save()?;

            eprintln!(
                "[watch] {} new post(s) in /{board}/ {thread_id}",
                changes.new_items.len()
            );
            for post in &changes.new_items {
                let payload = format::format(post, &board, &thread_id);
                dispatch::dispatch(self.notifier.as_ref(), &payload, self.store.recipients())
                    .await;
                self.last_notification = Some(payload);
            }
        }

        for threshold in changes.fired_thresholds {
            if !self.store.mark_threshold(threshold) {
                continue;
            }
            self.store.save()?;

            eprintln!("[watch] /{board}/ {thread_id} reached {threshold} posts");
            let payload = format::format_milestone(threshold, &board, &thread_id);
            dispatch::dispatch(self.notifier.as_ref(), &payload, self.store.recipients()).await;
        }

        Ok(())
    }

    /// Poll on a fixed period until cancelled.
    ///
    /// Ticks are strictly serialized — a slow tick delays the next one
    /// (missed timer ticks are skipped), so two polls never race on the
    /// watch state.
    pub async fn run(&mut self, period: std::time::Duration, cancel: CancellationToken) -> Result<()> {
        self.system_event(SystemEventKind::Restarted, "The watcher has been restarted.")
            .await;

        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Skip the first immediate tick.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    eprintln!("[watch] shutting down");
                    break;
                }

                _ = timer.tick() => {
                    if let Err(e) = self.tick().await {
                        eprintln!("[watch] tick error: {e}");
                    }
                }
            }
        }

        self.store.save()?;
        Ok(())
    }
}
