//! Group message send primitive.
//!
//! One call, one POST. No retries and no idempotency key: if the response is
//! lost after the service accepted the message, sending again duplicates it.

use tracing::{debug, warn};

use crate::error::{Error, FailureKind, Result};
use crate::session::SessionClient;

const SEND_PATH: &str = "/webim/groupchat/send_message.json";

/// Timeout hint the web client passes along with every message.
pub const SET_TIMEOUT: &str = "50";
/// `media_type` for plain text.
pub const MEDIA_TYPE_PLAIN: &str = "0";
/// Client annotation identifying the sender as the web chat client.
pub const CLIENT_ANNOTATIONS: &str = r#"{"webchat":1,"clientid":"mx8y819bfek0ds5fpi18ltpgulg1goq"}"#;
pub const NOT_ENCODED: &str = "0";

/// Parameters of one outbound group message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub group_id: i64,
    pub content: String,
    pub media_type: &'static str,
    pub annotations: &'static str,
    pub source: String,
}

impl SendRequest {
    /// Plain-text message with the web client's fixed annotations.
    pub fn plain(group_id: i64, content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            group_id,
            content: content.into(),
            media_type: MEDIA_TYPE_PLAIN,
            annotations: CLIENT_ANNOTATIONS,
            source: source.into(),
        }
    }

    /// Form fields in the order the web client sends them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("setTimeout", SET_TIMEOUT.to_string()),
            ("content", self.content.clone()),
            ("id", self.group_id.to_string()),
            ("media_type", self.media_type.to_string()),
            ("annotations", self.annotations.to_string()),
            ("is_encoded", NOT_ENCODED.to_string()),
            ("source", self.source.clone()),
        ]
    }
}

/// Why a send did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    /// Status + body for HTTP failures, error text otherwise.
    pub detail: String,
}

impl SendFailure {
    pub fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            status: None,
            detail: "batch cancelled before this target was attempted".to_string(),
        }
    }
}

impl From<Error> for SendFailure {
    fn from(err: Error) -> Self {
        Self {
            kind: err.failure_kind(),
            status: err.status(),
            detail: err.to_string(),
        }
    }
}

/// Result of delivering to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub group_id: i64,
    /// Raw response body on success. The JSON envelope is not interpreted.
    pub result: std::result::Result<String, SendFailure>,
}

impl SendOutcome {
    pub fn success(group_id: i64, body: String) -> Self {
        Self {
            group_id,
            result: Ok(body),
        }
    }

    pub fn failure(group_id: i64, failure: SendFailure) -> Self {
        Self {
            group_id,
            result: Err(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn failure_ref(&self) -> Option<&SendFailure> {
        self.result.as_ref().err()
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.failure_ref().map(|f| f.kind)
    }
}

/// Anything that can deliver a single [`SendRequest`].
///
/// The dispatcher only talks to this seam, so pacing and accounting can be
/// exercised without a network.
#[allow(async_fn_in_trait)]
pub trait MessageSender {
    async fn send(&self, request: &SendRequest) -> SendOutcome;
}

impl<T: MessageSender + ?Sized> MessageSender for &T {
    async fn send(&self, request: &SendRequest) -> SendOutcome {
        (**self).send(request).await
    }
}

/// Sends group messages through an authenticated session.
#[derive(Debug, Clone)]
pub struct GroupSender {
    session: SessionClient,
}

impl GroupSender {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    /// POST one message. Any 2xx counts as delivered; returns the raw body.
    pub async fn send_message(&self, request: &SendRequest) -> Result<String> {
        let response = self
            .session
            .post_form(SEND_PATH)
            .form(&request.form_fields())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

impl MessageSender for GroupSender {
    async fn send(&self, request: &SendRequest) -> SendOutcome {
        match self.send_message(request).await {
            Ok(body) => {
                debug!(gid = request.group_id, %body, "Message accepted");
                SendOutcome::success(request.group_id, body)
            }
            Err(err) => {
                warn!(gid = request.group_id, "Send failed: {}", err);
                SendOutcome::failure(request.group_id, err.into())
            }
        }
    }
}
