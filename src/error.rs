//! Error types for the Weibo group sender

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed with HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Transport error: {0}")]
    TransportFailed(String),

    #[error("Failed to decode response: {message} (body: {body})")]
    DecodeFailed { message: String, body: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not logged in: no session cookies stored")]
    NotLoggedIn,

    #[error("Session is locked by another process")]
    SessionLocked,

    #[error("Failed to acquire session lock: {0}")]
    LockError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status carried by the error, if the remote side answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403, which is how an expired session shows up.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Classification used when the error is recorded as a send outcome.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::RequestFailed { status, .. } if matches!(status, 401 | 403) => {
                FailureKind::Unauthorized
            }
            Error::RequestFailed { .. } => FailureKind::RequestFailed,
            Error::TransportFailed(_) => FailureKind::TransportFailed,
            Error::DecodeFailed { .. } => FailureKind::DecodeFailed,
            _ => FailureKind::Invalid,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::TransportFailed(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

/// Why a single send did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// 401/403: the session cookies are no longer accepted.
    Unauthorized,
    /// Any other non-2xx status.
    RequestFailed,
    /// Connection refused, timeout, DNS and friends.
    TransportFailed,
    DecodeFailed,
    /// The batch was cancelled before this target was attempted.
    Cancelled,
    /// The request could not be built.
    Invalid,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::RequestFailed => "request_failed",
            FailureKind::TransportFailed => "transport_failed",
            FailureKind::DecodeFailed => "decode_failed",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Invalid => "invalid",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
