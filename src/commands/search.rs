//! Group directory search command

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::metrics;
use crate::session::SessionClient;
use crate::weibo::{DirectoryClient, GroupRecord};

/// Shown when the service rejects the stored session.
pub const RELOGIN_HINT: &str =
    "The session cookies look expired. Run `weibo_group_sender login` and paste fresh cookies.";

/// Search and count the attempt in metrics.
pub async fn find_groups(
    client: &DirectoryClient,
    keyword: &str,
    source: &str,
) -> crate::Result<Vec<GroupRecord>> {
    let result = client.search(keyword, source).await;
    metrics::record_search(result.is_ok());
    result
}

/// One `n. name (ID: gid)` line per group, numbered from 1.
pub fn format_groups(groups: &[GroupRecord]) -> String {
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| format!("{}. {} (ID: {})", i + 1, group.name, group.id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print hint for 401/403, then pass the error on.
pub fn explain_search_error(err: crate::Error) -> anyhow::Error {
    if err.is_unauthorized() {
        println!("🔒 {}", RELOGIN_HINT);
    }
    anyhow::Error::new(err).context("Group search failed")
}

pub async fn run(config_path: &Path, keyword: &str) -> Result<()> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        anyhow::bail!("Search keyword must not be empty");
    }

    let config = Config::load(config_path)?;
    let credential = config.credential()?;
    let client = DirectoryClient::new(SessionClient::new(&credential)?);

    let groups = find_groups(&client, keyword, &config.source)
        .await
        .map_err(explain_search_error)?;

    if groups.is_empty() {
        println!("No groups found for '{}'", keyword);
        return Ok(());
    }

    println!("Found {} groups:", groups.len());
    println!("{}", format_groups(&groups));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::SessionCredential;
    use httpmock::prelude::*;

    fn group(id: i64, name: &str) -> GroupRecord {
        serde_json::from_value(serde_json::json!({ "gid": id, "groupname": name })).unwrap()
    }

    #[test]
    fn formats_numbered_list() {
        let groups = vec![group(123, "G1"), group(456, "Rust 社区")];
        assert_eq!(
            format_groups(&groups),
            "1. G1 (ID: 123)\n2. Rust 社区 (ID: 456)"
        );
    }

    #[test]
    fn empty_list_formats_to_nothing() {
        assert_eq!(format_groups(&[]), "");
    }

    #[tokio::test]
    async fn find_groups_passes_results_through() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).query_param("key", "rust");
            then.status(200).json_body(serde_json::json!({
                "groups": { "group_result_list": [ { "gid": 9, "groupname": "rustaceans" } ] }
            }));
        });

        let session =
            SessionClient::with_base_url(&SessionCredential::new("SUB=b"), server.base_url())
                .unwrap();
        let client = DirectoryClient::new(session);

        let groups = find_groups(&client, "rust", "1").await.unwrap();
        assert_eq!(groups, vec![group(9, "rustaceans")]);
    }

    #[test]
    fn unauthorized_error_keeps_its_cause() {
        let err = explain_search_error(crate::Error::RequestFailed {
            status: 401,
            body: String::new(),
        });
        let cause = err.downcast_ref::<crate::Error>().expect("cause");
        assert!(cause.is_unauthorized());
    }

    #[tokio::test]
    async fn empty_keyword_is_rejected_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("config.json"), "  ").await.unwrap_err();
        assert!(err.to_string().contains("keyword"));
    }
}
