//! Content formatter — turns one raw post into a clean notification payload.
//!
//! The post body arrives as entity-escaped HTML. Formatting strips tags,
//! unescapes entities, and rewrites `>>NNNN` back-references into clickable
//! markdown permalinks. It never fails on malformed markup — worst case the
//! body goes out verbatim with no rewritten references.

use crate::diff::THRESHOLDS;
use crate::fetch::Item;
use crate::notify::{NotificationPayload, Severity};

/// Web base for human-facing post permalinks.
const WEB_BASE: &str = "https://boards.4chan.org";

/// Permalink for a single post within a thread.
pub fn post_url(board: &str, thread_id: &str, post_id: impl std::fmt::Display) -> String {
    format!("{WEB_BASE}/{board}/thread/{thread_id}#p{post_id}")
}

/// Severity derived from a post's position against the milestone thresholds:
/// below the first is routine, between the two is a warning, at or past the
/// second is critical.
pub fn severity_for_position(position: u32) -> Severity {
    if position >= THRESHOLDS[1] {
        Severity::Critical
    } else if position >= THRESHOLDS[0] {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// Format one post into a notification payload. Pure — same input, same
/// content, every time.
pub fn format(item: &Item, board: &str, thread_id: &str) -> NotificationPayload {
    let text = strip_tags(&item.raw_body);
    let text = unescape_entities(&text);
    let body = link_quotes(&text, board, thread_id);

    let mut payload = NotificationPayload::new(
        severity_for_position(item.position),
        format!("New post in /{board}/ thread {thread_id}"),
        body,
    )
    .with_permalink(post_url(board, thread_id, item.sequence))
    .with_footer(format!(
        "Post ID: {} • Post number: {}",
        item.sequence, item.position
    ));

    if let Some(media) = &item.media {
        payload = payload.with_media_url(media.clone());
    }

    payload
}

/// Format a milestone crossing into a notification payload.
pub fn format_milestone(threshold: u32, board: &str, thread_id: &str) -> NotificationPayload {
    NotificationPayload::new(
        severity_for_position(threshold),
        format!("Thread /{board}/ {thread_id} milestone"),
        format!("Thread has reached {threshold} posts."),
    )
    .with_permalink(format!("{WEB_BASE}/{board}/thread/{thread_id}"))
}

/// Remove HTML tags. `<br>` variants become newlines; everything else is
/// dropped. A dangling `<` with no closing `>` passes through verbatim.
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => {
                let tag = &rest[open + 1..open + close];
                if tag.trim_end_matches('/').trim().eq_ignore_ascii_case("br") {
                    out.push('\n');
                }
                rest = &rest[open + close + 1..];
            }
            None => {
                // Unterminated tag — keep the remainder as-is.
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Unescape the HTML entities the source emits in post bodies.
fn unescape_entities(text: &str) -> String {
    // `&amp;` last, so `&amp;gt;` unescapes exactly one level.
    text.replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Rewrite `>>NNNN` back-references into markdown links pointing at the
/// referenced post. Surrounding whitespace is preserved; if a reference runs
/// straight into following text, a space is inserted so the link does not
/// swallow it.
fn link_quotes(text: &str, board: &str, thread_id: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '>' && i + 1 < chars.len() && chars[i + 1] == '>' {
            let digits_start = i + 2;
            let mut end = digits_start;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
            if end > digits_start {
                let id: String = chars[digits_start..end].iter().collect();
                out.push_str(&format!("[>>{id}]({})", post_url(board, thread_id, &id)));
                if end < chars.len() && !chars[end].is_whitespace() {
                    out.push(' ');
                }
                i = end;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}
