//! Console notifier — emits payloads as JSONL to stdout.
//!
//! Used when no Discord token is configured: deliveries print one JSON line
//! per target so the watch loop can be exercised end to end locally.

use async_trait::async_trait;
use color_eyre::Result;

use crate::dispatch::Notifier;
use crate::notify::NotificationPayload;

/// Prints every delivery to stdout as JSONL.
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn emit(&self, target_kind: &str, target: &str, payload: &NotificationPayload) -> Result<()> {
        let json = serde_json::to_string(&serde_json::json!({
            "target_kind": target_kind,
            "target": target,
            "payload": payload,
        }))?;
        println!("{json}");
        Ok(())
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_direct(
        &self,
        recipient_id: &str,
        payload: &NotificationPayload,
    ) -> Result<()> {
        self.emit("direct", recipient_id, payload)
    }

    async fn send_channel(
        &self,
        channel_id: &str,
        payload: &NotificationPayload,
    ) -> Result<()> {
        self.emit("broadcast", channel_id, payload)
    }
}
