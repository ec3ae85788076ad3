//! Delivery channel integrations (Discord today, future Telegram/Slack).
//!
//! Each integration implements [`crate::dispatch::Notifier`] and owns the
//! platform-specific rendering of a [`crate::notify::NotificationPayload`].

pub mod console;
pub mod discord;
