//! Offline search over cached results.
//!
//! Scans every cache entry; `org_*` entries are searched as organizations and
//! `user_*` entries as users. A record matches when the lowercased term is a
//! substring of one of its searchable fields:
//!
//! | Entity | Fields |
//! |--------|--------|
//! | Organization | `displayName`, `erpAccountId`, `supportSiteId` |
//! | User | `firstName`, `lastName`, `emailAddress` |
//!
//! Missing fields never match. Hits are deduplicated by unique key across
//! all entries.

use serde::Serialize;

use crate::cache::Cache;
use crate::merge::ResultSet;
use crate::models::{EntityKind, Organization, User};

/// Matches found in the cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheHits {
    pub organizations: Vec<Organization>,
    pub users: Vec<User>,
}

impl CacheHits {
    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty() && self.users.is_empty()
    }
}

pub async fn search_cache(cache: &Cache, term: &str) -> CacheHits {
    let needle = term.to_lowercase();
    let org_namespace = format!("{}_", EntityKind::Organization.namespace());
    let user_namespace = format!("{}_", EntityKind::User.namespace());

    let mut organizations: ResultSet<Organization> = ResultSet::new();
    let mut users: ResultSet<User> = ResultSet::new();

    for key in cache.keys().await {
        if key.starts_with(&org_namespace) {
            if let Some(entries) = cache.get::<Vec<Organization>>(&key).await {
                organizations.extend(
                    entries
                        .into_iter()
                        .filter(|org| organization_matches(org, &needle)),
                );
            }
        } else if key.starts_with(&user_namespace) {
            if let Some(entries) = cache.get::<Vec<User>>(&key).await {
                users.extend(entries.into_iter().filter(|user| user_matches(user, &needle)));
            }
        }
    }

    tracing::debug!(
        organizations = organizations.len(),
        users = users.len(),
        "cache search"
    );

    CacheHits {
        organizations: organizations.into_vec(),
        users: users.into_vec(),
    }
}

fn organization_matches(org: &Organization, needle: &str) -> bool {
    let display_name = Some(org.display_name.as_str()).filter(|s| !s.is_empty());
    [
        display_name,
        org.erp_account_id.as_deref(),
        org.support_site_id.as_deref(),
    ]
    .into_iter()
    .any(|field| contains_ignore_case(field, needle))
}

fn user_matches(user: &User, needle: &str) -> bool {
    [
        user.first_name.as_deref(),
        user.last_name.as_deref(),
        Some(user.email_address.as_str()),
    ]
    .into_iter()
    .any(|field| contains_ignore_case(field, needle))
}

fn contains_ignore_case(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded_cache() -> Cache {
        let cache = Cache::in_memory("bml");
        cache
            .put(
                "org_acme",
                &json!([
                    { "orgId": "1", "displayName": "Acme Corp", "erpAccountId": "E1" },
                    { "orgId": "2", "displayName": "Beta LLC", "supportSiteId": "ACME-77" }
                ]),
            )
            .await;
        cache
            .put(
                "org_E1",
                &json!([{ "orgId": "1", "displayName": "Acme Corp", "erpAccountId": "E1" }]),
            )
            .await;
        cache
            .put(
                "user_jane@example.com",
                &json!([{
                    "emailAddress": "jane@example.com",
                    "firstName": "Jane",
                    "lastName": "Acmeson",
                    "active": true,
                    "roles": ["ADMIN"],
                    "memberships": []
                }]),
            )
            .await;
        cache
    }

    #[tokio::test]
    async fn test_single_cached_organization() {
        let cache = Cache::in_memory("bml");
        cache
            .put(
                "org_acme",
                &json!([{ "orgId": "1", "displayName": "Acme Corp", "erpAccountId": "E1" }]),
            )
            .await;

        let hits = search_cache(&cache, "acme").await;
        assert_eq!(hits.organizations.len(), 1);
        assert_eq!(hits.organizations[0].org_id, "1");
        assert_eq!(hits.organizations[0].display_name, "Acme Corp");
        assert!(hits.users.is_empty());
    }

    #[tokio::test]
    async fn test_dedup_across_entries_and_case_insensitive() {
        let cache = seeded_cache().await;
        let hits = search_cache(&cache, "ACME").await;

        let ids: Vec<&str> = hits
            .organizations
            .iter()
            .map(|o| o.org_id.as_str())
            .collect();
        // "1" is cached under two keys but reported once; "2" matches on supportSiteId.
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(hits.users.len(), 1);
        assert_eq!(hits.users[0].email_address, "jane@example.com");
    }

    #[tokio::test]
    async fn test_matches_on_optional_fields_only_when_present() {
        let cache = seeded_cache().await;

        let hits = search_cache(&cache, "e1").await;
        assert_eq!(hits.organizations.len(), 1);
        assert_eq!(hits.organizations[0].org_id, "1");

        let hits = search_cache(&cache, "acme-77").await;
        assert_eq!(hits.organizations.len(), 1);
        assert_eq!(hits.organizations[0].org_id, "2");
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let cache = seeded_cache().await;
        assert!(search_cache(&cache, "zeta").await.is_empty());

        let empty = Cache::in_memory("bml");
        assert!(search_cache(&empty, "acme").await.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_entries_are_skipped() {
        let cache = seeded_cache().await;
        cache.put("org_broken", &json!({ "not": "a list" })).await;
        let hits = search_cache(&cache, "acme").await;
        assert_eq!(hits.organizations.len(), 2);
    }
}
