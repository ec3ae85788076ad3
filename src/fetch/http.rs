//! HTTP snapshot fetcher using raw reqwest (no framework).
//!
//! Fetches the published thread JSON (`{api_base}/{board}/thread/{id}.json`)
//! and decodes it into a [`Snapshot`]. Media attachments are resolved to full
//! URLs against the media base.

use async_trait::async_trait;
use serde::Deserialize;

use super::{FetchError, Item, Snapshot, SnapshotFetch};

/// Default thread-snapshot API base.
pub const DEFAULT_API_BASE: &str = "https://a.4cdn.org";

/// Default media host base.
pub const DEFAULT_MEDIA_BASE: &str = "https://i.4cdn.org";

/// Fetches thread snapshots over HTTP.
pub struct HttpFetcher {
    /// HTTP client, reused across polls for connection pooling.
    client: reqwest::Client,
    api_base: String,
    media_base: String,
}

// --- Thread JSON response types ---

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    #[serde(default)]
    posts: Vec<RawPost>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    /// Post sequence number.
    no: u64,

    /// Raw HTML comment body (absent for image-only posts).
    #[serde(default)]
    com: Option<String>,

    /// Media upload timestamp — together with `ext` identifies the file.
    #[serde(default)]
    tim: Option<u64>,

    /// Media file extension, including the dot (e.g. ".png").
    #[serde(default)]
    ext: Option<String>,
}

impl HttpFetcher {
    pub fn new(api_base: impl Into<String>, media_base: impl Into<String>) -> Self {
        // Bounds a hung fetch so the poll timer is never blocked indefinitely.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            api_base: api_base.into(),
            media_base: media_base.into(),
        }
    }

    fn thread_url(&self, board: &str, thread_id: &str) -> String {
        format!("{}/{board}/thread/{thread_id}.json", self.api_base)
    }

    /// Decode a thread JSON body into a snapshot.
    fn parse_thread(&self, board: &str, body: &str) -> Result<Snapshot, FetchError> {
        let response: ThreadResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        let post_count = response.posts.len() as u32;
        let items = response
            .posts
            .into_iter()
            .enumerate()
            .map(|(index, post)| {
                let media = match (post.tim, post.ext.as_deref()) {
                    (Some(tim), Some(ext)) => {
                        Some(format!("{}/{board}/{tim}{ext}", self.media_base))
                    }
                    _ => None,
                };
                Item {
                    sequence: post.no,
                    raw_body: post.com.unwrap_or_default(),
                    media,
                    position: (index + 1) as u32,
                }
            })
            .collect();

        Ok(Snapshot { items, post_count })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, DEFAULT_MEDIA_BASE)
    }
}

#[async_trait]
impl SnapshotFetch for HttpFetcher {
    async fn fetch(&self, board: &str, thread_id: &str) -> Result<Snapshot, FetchError> {
        let url = self.thread_url(board, thread_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Transient(format!("{url} returned {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        self.parse_thread(board, &body)
    }
}
