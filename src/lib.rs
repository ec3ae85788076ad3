//! Lurk library — re-exports modules for integration tests and the binary.

pub mod channel;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod fetch;
pub mod format;
pub mod notify;
pub mod state;
pub mod store;
pub mod watch;
