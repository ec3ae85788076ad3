//! Snapshot fetching — the abstract capability and its error taxonomy.
//!
//! The watch loop depends only on [`SnapshotFetch`]; the real HTTP
//! implementation lives in [`http`]. The fetcher performs no retries itself —
//! retry policy belongs to the poll timer.

pub mod http;

use async_trait::async_trait;

/// Why a snapshot fetch failed, and what the caller should do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Thread deleted or pruned — terminal, caller should untrack.
    NotFound,

    /// Network trouble or a 5xx — retry on the next tick.
    Transient(String),

    /// Response did not have the expected shape — logged with detail,
    /// treated as transient for retry purposes.
    Malformed(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "thread not found"),
            Self::Transient(detail) => write!(f, "transient fetch failure: {detail}"),
            Self::Malformed(detail) => write!(f, "malformed snapshot response: {detail}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// One post within a thread snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Source-assigned sequence number, monotonically increasing per thread.
    pub sequence: u64,

    /// Raw (markup-laden) post body. Empty if the post had no text.
    pub raw_body: String,

    /// Full URL of the attached media, if any.
    pub media: Option<String>,

    /// 1-based index within the snapshot at fetch time. Used for milestone
    /// severity, not a stable identity.
    pub position: u32,
}

/// A point-in-time ordered view of all currently-visible posts in a thread,
/// ascending by sequence number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub post_count: u32,
}

impl Snapshot {
    /// The highest sequence number currently in the thread.
    pub fn last_sequence(&self) -> Option<u64> {
        self.items.last().map(|item| item.sequence)
    }
}

/// Abstract "fetch thread snapshot" capability.
#[async_trait]
pub trait SnapshotFetch: Send + Sync {
    async fn fetch(&self, board: &str, thread_id: &str) -> Result<Snapshot, FetchError>;
}
