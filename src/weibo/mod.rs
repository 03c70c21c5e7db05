//! Weibo web chat API clients.
//!
//! Provides:
//! - Group directory search by keyword
//! - Single group message delivery

pub mod directory;
pub mod models;
pub mod sender;

pub use directory::DirectoryClient;
pub use models::GroupRecord;
pub use sender::{GroupSender, MessageSender, SendFailure, SendOutcome, SendRequest};
