//! Core data models: organizations, users, and the fields they are searched by.
//!
//! [`Organization`] and [`User`] are the normalized shapes used everywhere
//! after the API boundary, and they are also what the cache stores. The API's
//! raw user record ([`ApiUser`]) carries roles as a JSON-encoded string inside
//! `pvUserSetting`; it is decoded once, in [`ApiUser::normalize`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which query parameter produced an organization hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchType {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "erpAccountId")]
    ErpAccountId,
    #[serde(rename = "supportSiteId")]
    SupportSiteId,
}

impl SearchType {
    /// The three organization fields queried for every free-text search,
    /// in dispatch order.
    pub const ALL: [SearchType; 3] = [
        SearchType::Name,
        SearchType::ErpAccountId,
        SearchType::SupportSiteId,
    ];

    /// Query parameter name understood by the organization endpoint.
    pub fn query_param(self) -> &'static str {
        match self {
            SearchType::Name => "name",
            SearchType::ErpAccountId => "erpAccountId",
            SearchType::SupportSiteId => "supportSiteId",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_param())
    }
}

/// Entity namespace used in cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Organization,
    User,
}

impl EntityKind {
    pub fn namespace(self) -> &'static str {
        match self {
            EntityKind::Organization => "org",
            EntityKind::User => "user",
        }
    }

    /// Logical cache key for a search term: `{namespace}_{term}`.
    pub fn cache_key(self, term: &str) -> String {
        format!("{}_{}", self.namespace(), term)
    }
}

/// An organization record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(deserialize_with = "text_or_number")]
    pub org_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(
        default,
        deserialize_with = "opt_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub server: String,
    #[serde(
        default,
        deserialize_with = "opt_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub erp_account_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub support_site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_search_type: Option<SearchType>,
}

impl Organization {
    /// Link to the organization's page on its own server, if the server is known.
    pub fn portal_url(&self) -> Option<String> {
        if self.server.is_empty() {
            return None;
        }
        Some(format!("https://{}/pvc/?st={}", self.server, self.org_id))
    }
}

/// A user record, with roles already decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl User {
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub organization: MembershipOrganization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipOrganization {
    #[serde(deserialize_with = "text_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
}

/// A user exactly as the user endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub pv_user_setting: Option<PvUserSetting>,
    #[serde(default)]
    pub memberships: Option<Vec<Membership>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PvUserSetting {
    /// JSON-encoded array of role names, e.g. `"[\"ADMIN\",\"VIEWER\"]"`.
    #[serde(default)]
    pub roles: Option<serde_json::Value>,
}

impl ApiUser {
    /// Convert to a [`User`]. Returns `None` when the record has no email
    /// address, since it could never be deduplicated or cached.
    pub fn normalize(self) -> Option<User> {
        let email_address = self.email_address.filter(|e| !e.is_empty())?;
        let roles = decode_roles(self.pv_user_setting.and_then(|s| s.roles));
        Some(User {
            email_address,
            first_name: self.first_name,
            last_name: self.last_name,
            active: self.active.unwrap_or(false),
            roles,
            memberships: self.memberships.unwrap_or_default(),
        })
    }
}

/// Decode the nested role list. Accepts the encoded string form or a plain
/// array; anything else yields no roles.
fn decode_roles(raw: Option<serde_json::Value>) -> Vec<String> {
    let value = match raw {
        Some(serde_json::Value::String(encoded)) => {
            match serde_json::from_str::<serde_json::Value>(&encoded) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(error = %e, "could not decode user roles");
                    return Vec::new();
                }
            }
        }
        Some(other) => other,
        None => return Vec::new(),
    };

    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl From<TextOrNumber> for String {
    fn from(v: TextOrNumber) -> Self {
        match v {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    TextOrNumber::deserialize(d).map(String::from)
}

/// Text field where an explicit `null` means the same as a missing key.
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(d).map(Option::unwrap_or_default)
}

fn opt_text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<TextOrNumber>::deserialize(d).map(|v| v.map(String::from))
}
