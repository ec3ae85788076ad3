//! Notification fan-out.
//!
//! One payload goes to every direct recipient and every broadcast channel
//! through a [`Notifier`]. Each delivery is attempted independently — a
//! blocked DM or deleted channel is logged and recorded in the report, and
//! never stops the remaining deliveries or the poll cycle. Failed deliveries
//! are not retried within the cycle.

use async_trait::async_trait;

use crate::notify::NotificationPayload;
use crate::store::RecipientSet;

/// Trait for delivery integrations (Discord today, others later).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Deliver a payload privately to one recipient.
    async fn send_direct(&self, recipient_id: &str, payload: &NotificationPayload)
    -> color_eyre::Result<()>;

    /// Deliver a payload to one broadcast channel.
    async fn send_channel(&self, channel_id: &str, payload: &NotificationPayload)
    -> color_eyre::Result<()>;
}

/// What kind of target a delivery went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Direct,
    Broadcast,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub target: String,
    pub kind: TargetKind,
    /// `None` on success, the error text on failure.
    pub error: Option<String>,
}

/// Per-target outcomes for one dispatched payload.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub deliveries: Vec<Delivery>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.iter().filter(|d| d.error.is_some()).count()
    }
}

/// Fan one payload out to all recipients. Never fails; per-target errors are
/// logged and recorded in the returned report.
pub async fn dispatch(
    notifier: &dyn Notifier,
    payload: &NotificationPayload,
    recipients: &RecipientSet,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for recipient in &recipients.direct_recipients {
        let error = match notifier.send_direct(recipient, payload).await {
            Ok(()) => None,
            Err(e) => {
                eprintln!(
                    "[dispatch] {} direct delivery to {recipient} failed: {e}",
                    notifier.name()
                );
                Some(e.to_string())
            }
        };
        report.deliveries.push(Delivery {
            target: recipient.clone(),
            kind: TargetKind::Direct,
            error,
        });
    }

    for channel in &recipients.broadcast_channels {
        let error = match notifier.send_channel(channel, payload).await {
            Ok(()) => None,
            Err(e) => {
                eprintln!(
                    "[dispatch] {} channel delivery to {channel} failed: {e}",
                    notifier.name()
                );
                Some(e.to_string())
            }
        };
        report.deliveries.push(Delivery {
            target: channel.clone(),
            kind: TargetKind::Broadcast,
            error,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;
    use std::sync::Mutex;

    /// Records deliveries; fails for targets listed in `failing`.
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        failing: Vec<String>,
    }

    impl RecordingNotifier {
        fn new(failing: &[&str]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing: failing.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send_direct(
            &self,
            recipient_id: &str,
            _payload: &NotificationPayload,
        ) -> color_eyre::Result<()> {
            if self.failing.iter().any(|f| f == recipient_id) {
                color_eyre::eyre::bail!("blocked DMs");
            }
            self.sent.lock().unwrap().push(format!("dm:{recipient_id}"));
            Ok(())
        }

        async fn send_channel(
            &self,
            channel_id: &str,
            _payload: &NotificationPayload,
        ) -> color_eyre::Result<()> {
            if self.failing.iter().any(|f| f == channel_id) {
                color_eyre::eyre::bail!("channel deleted");
            }
            self.sent.lock().unwrap().push(format!("ch:{channel_id}"));
            Ok(())
        }
    }

    fn recipients(direct: &[&str], channels: &[&str]) -> RecipientSet {
        RecipientSet {
            direct_recipients: direct.iter().map(|s| s.to_string()).collect(),
            broadcast_channels: channels.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload::new(Severity::Info, "t", "b")
    }

    #[tokio::test]
    async fn test_dispatch_reaches_all_targets() {
        let notifier = RecordingNotifier::new(&[]);
        let report = dispatch(&notifier, &payload(), &recipients(&["u1", "u2"], &["c1"])).await;

        assert_eq!(report.delivered(), 3);
        assert_eq!(report.failed(), 0);

        let sent = notifier.sent.lock().unwrap();
        assert!(sent.contains(&"dm:u1".to_string()));
        assert!(sent.contains(&"dm:u2".to_string()));
        assert!(sent.contains(&"ch:c1".to_string()));
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let notifier = RecordingNotifier::new(&["u2"]);
        let report = dispatch(&notifier, &payload(), &recipients(&["u1", "u2", "u3"], &[])).await;

        assert_eq!(report.delivered(), 2);
        assert_eq!(report.failed(), 1);

        let failed: Vec<_> = report
            .deliveries
            .iter()
            .filter(|d| d.error.is_some())
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].target, "u2");

        let sent = notifier.sent.lock().unwrap();
        assert!(sent.contains(&"dm:u1".to_string()));
        assert!(sent.contains(&"dm:u3".to_string()));
    }

    #[tokio::test]
    async fn test_dispatch_empty_recipients() {
        let notifier = RecordingNotifier::new(&[]);
        let report = dispatch(&notifier, &payload(), &RecipientSet::default()).await;
        assert!(report.deliveries.is_empty());
    }

    #[tokio::test]
    async fn test_report_records_target_kinds() {
        let notifier = RecordingNotifier::new(&[]);
        let report = dispatch(&notifier, &payload(), &recipients(&["u1"], &["c1"])).await;

        let direct = report
            .deliveries
            .iter()
            .find(|d| d.target == "u1")
            .unwrap();
        let broadcast = report
            .deliveries
            .iter()
            .find(|d| d.target == "c1")
            .unwrap();
        assert_eq!(direct.kind, TargetKind::Direct);
        assert_eq!(broadcast.kind, TargetKind::Broadcast);
    }
}
