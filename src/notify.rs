//! Notification payload type — the watch loop produces these, delivery
//! channels consume them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level for a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A format-agnostic notification about one thread event (a new post, a
/// milestone crossing, or a system notice). Rendering it into a
/// platform-specific rich message is the delivery channel's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Unique identifier for this notification.
    pub id: String,

    /// Short human-readable title.
    pub title: String,

    /// Full body text (already cleaned and cross-reference-linked).
    pub body: String,

    /// URL linking to the post or thread this notification is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,

    /// How urgent this notification is.
    pub severity: Severity,

    /// Optional attached media URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,

    /// Optional footer line (post id, position, etc.).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,

    /// When this notification was created.
    pub timestamp: DateTime<Utc>,
}

impl NotificationPayload {
    /// Create a new payload with the minimum required fields.
    ///
    /// Generates a UUID v4 for the `id` and stamps `timestamp` to now.
    pub fn new(severity: Severity, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            permalink: None,
            severity,
            media_url: None,
            footer: None,
            timestamp: Utc::now(),
        }
    }

    /// Set the permalink.
    pub fn with_permalink(mut self, url: impl Into<String>) -> Self {
        self.permalink = Some(url.into());
        self
    }

    /// Set the media URL.
    pub fn with_media_url(mut self, url: impl Into<String>) -> Self {
        self.media_url = Some(url.into());
        self
    }

    /// Set the footer.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}
