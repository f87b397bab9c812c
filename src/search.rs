//! Search orchestration.
//!
//! [`Searcher`] picks a branch per call from the caller's authentication flag:
//!
//! ```text
//!              ┌── authenticated ──▶ DirectoryApi ──▶ merge ──▶ Cache::put ──▶ Found(Live)
//! term ──trim──┤
//!              └── not authenticated ──▶ search_cache ──▶ Found(Cache) | NoCachedData
//! ```
//!
//! Organization search fans out to three concurrent queries (name, ERP
//! account id, support site id) because the field a free-text term refers to
//! is unknown. [`settle_all`] waits for all three regardless of failures and
//! reports each branch separately; only successful branches are merged.
//! Failed branches are carried in the outcome as [`BranchFailure`]s so the
//! caller can warn that results may be incomplete. If every branch fails the
//! search fails, preferring [`LookupError::AccessRestricted`] as the reason.
//!
//! User search issues a single query by email; there is no fan-out.

use serde::Serialize;
use std::sync::Arc;

use crate::cache::Cache;
use crate::cache_search::{search_cache, CacheHits};
use crate::client::DirectoryApi;
use crate::error::LookupError;
use crate::merge::ResultSet;
use crate::models::{EntityKind, Organization, SearchType, User};

/// Where the results of a search came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Live,
    Cache,
}

/// A fan-out branch that failed and was left out of the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchFailure {
    pub field: SearchType,
    pub error: LookupError,
}

/// Settled result of one fan-out branch.
#[derive(Debug)]
pub struct Branch<T> {
    pub field: SearchType,
    pub result: Result<T, LookupError>,
}

#[derive(Debug, PartialEq)]
pub enum SearchOutcome<T> {
    /// The term was blank; nothing was queried or read.
    Skipped,
    Found {
        items: Vec<T>,
        origin: Origin,
        /// Always empty for cache results and user searches.
        partial_failures: Vec<BranchFailure>,
    },
    /// Offline search with no matching cached records.
    NoCachedData,
    Failed(LookupError),
}

impl<T> SearchOutcome<T> {
    pub fn items(&self) -> &[T] {
        match self {
            SearchOutcome::Found { items, .. } => items,
            _ => &[],
        }
    }
}

pub struct Searcher {
    api: Arc<dyn DirectoryApi>,
    cache: Cache,
}

impl Searcher {
    pub fn new(api: Arc<dyn DirectoryApi>, cache: Cache) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub async fn search_organizations(
        &self,
        term: &str,
        authenticated: bool,
    ) -> SearchOutcome<Organization> {
        let term = term.trim();
        if term.is_empty() {
            return SearchOutcome::Skipped;
        }
        if !authenticated {
            return self.from_cache(term, |hits| hits.organizations).await;
        }

        let branches = settle_all(self.api.as_ref(), term).await;
        let (merged, partial_failures) = merge_branches(branches);

        if merged.is_empty() && partial_failures.len() == SearchType::ALL.len() {
            return SearchOutcome::Failed(primary_error(&partial_failures));
        }

        for failure in &partial_failures {
            tracing::warn!(
                field = %failure.field,
                error = %failure.error,
                "organization query failed; results may be incomplete"
            );
        }

        let items = merged.into_vec();
        self.cache
            .put(&EntityKind::Organization.cache_key(term), &items)
            .await;
        tracing::info!(term, results = items.len(), "organization search");

        SearchOutcome::Found {
            items,
            origin: Origin::Live,
            partial_failures,
        }
    }

    pub async fn search_users(&self, term: &str, authenticated: bool) -> SearchOutcome<User> {
        let term = term.trim();
        if term.is_empty() {
            return SearchOutcome::Skipped;
        }
        if !authenticated {
            return self.from_cache(term, |hits| hits.users).await;
        }

        match self.api.query_users(term).await {
            Ok(users) => {
                let items = users.into_iter().collect::<ResultSet<_>>().into_vec();
                self.cache
                    .put(&EntityKind::User.cache_key(term), &items)
                    .await;
                tracing::info!(term, results = items.len(), "user search");
                SearchOutcome::Found {
                    items,
                    origin: Origin::Live,
                    partial_failures: Vec::new(),
                }
            }
            Err(e) => {
                tracing::warn!(term, error = %e, "user search failed");
                SearchOutcome::Failed(e)
            }
        }
    }

    async fn from_cache<T>(
        &self,
        term: &str,
        pick: impl FnOnce(CacheHits) -> Vec<T>,
    ) -> SearchOutcome<T> {
        let items = pick(search_cache(&self.cache, term).await);
        if items.is_empty() {
            return SearchOutcome::NoCachedData;
        }
        SearchOutcome::Found {
            items,
            origin: Origin::Cache,
            partial_failures: Vec::new(),
        }
    }
}

/// Run the three organization queries concurrently and wait for all of them.
///
/// Branches come back in [`SearchType::ALL`] order. No branch is cancelled
/// because another failed.
pub async fn settle_all(api: &dyn DirectoryApi, term: &str) -> Vec<Branch<Vec<Organization>>> {
    let (by_name, by_erp, by_site) = tokio::join!(
        api.query_organizations(term, SearchType::Name),
        api.query_organizations(term, SearchType::ErpAccountId),
        api.query_organizations(term, SearchType::SupportSiteId),
    );

    SearchType::ALL
        .into_iter()
        .zip([by_name, by_erp, by_site])
        .map(|(field, result)| Branch { field, result })
        .collect()
}

/// Merge successful branches by `orgId` and collect the failures.
pub fn merge_branches(
    branches: Vec<Branch<Vec<Organization>>>,
) -> (ResultSet<Organization>, Vec<BranchFailure>) {
    let mut merged = ResultSet::new();
    let mut failures = Vec::new();

    for branch in branches {
        match branch.result {
            Ok(orgs) => merged.extend(orgs),
            Err(error) => failures.push(BranchFailure {
                field: branch.field,
                error,
            }),
        }
    }

    (merged, failures)
}

fn primary_error(failures: &[BranchFailure]) -> LookupError {
    failures
        .iter()
        .find(|f| f.error.is_access_restricted())
        .or_else(|| failures.first())
        .map(|f| f.error.clone())
        .unwrap_or_else(|| LookupError::FetchFailed("no queries were run".to_string()))
}
