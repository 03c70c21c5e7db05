//! Weibo Group Chat Broadcaster Library
//!
//! This library provides tools to:
//! - Store a Weibo web session (browser cookies) and attach it to API calls
//! - Search the group chats visible to the session by keyword
//! - Send a text message to one group chat
//! - Broadcast a message to many groups, one at a time, with a pause between sends
//! - Export per-group outcomes as CSV and expose Prometheus metrics

pub mod config;
pub mod cookies;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod session;
pub mod weibo;

// Re-export common types
pub use config::Config;
pub use cookies::SessionCredential;
pub use dispatch::{BatchReport, DispatchEvent, Dispatcher, Pacer, TokioPacer};
pub use error::{Error, FailureKind, Result};
pub use session::{SessionClient, SessionLock};
pub use weibo::{
    DirectoryClient, GroupRecord, GroupSender, MessageSender, SendFailure, SendOutcome,
    SendRequest,
};

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;
