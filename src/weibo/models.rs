//! Wire types for the Weibo web chat API.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One discoverable group chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(rename = "gid")]
    pub id: i64,
    #[serde(rename = "groupname", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_avatar_urls: Vec<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub avatar_large: Option<String>,
    #[serde(default)]
    pub round_profile_image_url: Option<String>,
    #[serde(default)]
    pub round_avatar_large: Option<String>,
}

/// Response of `messageboxsearch.json`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contacts: ContactsSection,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: GroupsSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactsSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub num: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_num: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupsSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_member_num: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_result_list: Vec<GroupRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_num: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_num: i64,
}
