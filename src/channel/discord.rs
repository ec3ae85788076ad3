//! Discord REST client using raw reqwest (no framework).
//!
//! Direct recipients get a DM channel created via `POST /users/@me/channels`;
//! broadcast channels are posted to directly. Payloads render as a single
//! embed: title, body, permalink, severity color, optional image and footer.

use async_trait::async_trait;
use color_eyre::eyre::Result;
use serde::Deserialize;

use crate::dispatch::Notifier;
use crate::notify::{NotificationPayload, Severity};

/// Discord REST API base.
const API_BASE: &str = "https://discord.com/api/v10";

/// Discord caps embed descriptions at 4096 chars; we truncate below that.
const MAX_DESCRIPTION_LEN: usize = 4000;

/// Sends notifications through the Discord REST API.
pub struct DiscordNotifier {
    bot_token: String,
    client: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct DmChannel {
    id: String,
}

impl DiscordNotifier {
    pub fn new(bot_token: String) -> Self {
        Self::with_api_base(bot_token, API_BASE)
    }

    /// Construct against a non-default API base (tests).
    pub fn with_api_base(bot_token: String, api_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");

        Self {
            bot_token,
            client,
            api_base: api_base.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    /// Post an embed message to a channel.
    async fn post_message(&self, channel_id: &str, payload: &NotificationPayload) -> Result<()> {
        let response = self
            .client
            .post(self.api_url(&format!("channels/{channel_id}/messages")))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&serde_json::json!({ "embeds": [embed_json(payload)] }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            color_eyre::eyre::bail!("Discord API returned {status} for channel {channel_id}: {body}");
        }

        Ok(())
    }

    /// Open (or reuse) the DM channel for a user.
    async fn open_dm(&self, user_id: &str) -> Result<DmChannel> {
        let response = self
            .client
            .post(self.api_url("users/@me/channels"))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&serde_json::json!({ "recipient_id": user_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            color_eyre::eyre::bail!("Discord API returned {status} opening DM with {user_id}");
        }

        Ok(response.json().await?)
    }
}

/// Render a payload as a Discord embed object.
fn embed_json(payload: &NotificationPayload) -> serde_json::Value {
    let mut description = payload.body.clone();
    if description.len() > MAX_DESCRIPTION_LEN {
        let mut cut = MAX_DESCRIPTION_LEN;
        while !description.is_char_boundary(cut) {
            cut -= 1;
        }
        description.truncate(cut);
        description.push('…');
    }

    let mut embed = serde_json::json!({
        "title": payload.title,
        "description": description,
        "color": severity_color(&payload.severity),
    });

    if let Some(url) = &payload.permalink {
        embed["url"] = serde_json::json!(url);
        embed["fields"] = serde_json::json!([
            { "name": "Post Link", "value": format!("[Go to Post]({url})"), "inline": false }
        ]);
    }
    if let Some(media) = &payload.media_url {
        embed["image"] = serde_json::json!({ "url": media });
    }
    if let Some(footer) = &payload.footer {
        embed["footer"] = serde_json::json!({ "text": footer });
    }

    embed
}

/// Discord embed accent color per severity.
fn severity_color(severity: &Severity) -> u32 {
    match severity {
        Severity::Critical => 0xe74c3c,
        Severity::Warning => 0xe67e22,
        Severity::Info => 0x3498db,
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send_direct(
        &self,
        recipient_id: &str,
        payload: &NotificationPayload,
    ) -> Result<()> {
        let dm = self.open_dm(recipient_id).await?;
        self.post_message(&dm.id, payload).await
    }

    async fn send_channel(
        &self,
        channel_id: &str,
        payload: &NotificationPayload,
    ) -> Result<()> {
        self.post_message(channel_id, payload).await
    }
}
