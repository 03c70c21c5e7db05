//! Group directory lookup.

use chrono::Utc;
use tracing::{debug, info};

use super::models::{GroupRecord, SearchResponse};
use crate::error::{Error, Result};
use crate::session::SessionClient;

const SEARCH_PATH: &str = "/webim/2/direct_messages/messageboxsearch.json";
/// Results per page. Only the first page is ever requested.
pub const PAGE_SIZE: u32 = 20;

/// Maps a keyword to the group chats the session can see.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    session: SessionClient,
}

impl DirectoryClient {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    /// Search groups by keyword, in the order the service ranks them.
    ///
    /// An empty keyword is forwarded as-is. A non-2xx answer is returned as
    /// [`Error::RequestFailed`] with the status untouched, so callers can spot
    /// an expired session with [`Error::is_unauthorized`].
    pub async fn search(&self, keyword: &str, source: &str) -> Result<Vec<GroupRecord>> {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let page_size = PAGE_SIZE.to_string();

        let response = self
            .session
            .get(SEARCH_PATH)
            .query(&[
                ("types", "contact,group"),
                ("key", keyword),
                ("pagecount", page_size.as_str()),
                ("source", source),
                ("t", timestamp.as_str()),
            ])
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

        let decoded: SearchResponse =
            serde_json::from_str(&body).map_err(|e| Error::DecodeFailed {
                message: e.to_string(),
                body: body.clone(),
            })?;

        let groups = decoded.groups.group_result_list;
        debug!(
            total = decoded.groups.total_num,
            returned = groups.len(),
            "Directory search decoded"
        );
        info!(%keyword, found = groups.len(), "Group search finished");
        Ok(groups)
    }
}
