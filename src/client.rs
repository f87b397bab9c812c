//! Remote query client for the organization-management API.
//!
//! Every query is a single `GET` with one query parameter:
//!
//! | Endpoint | Parameter |
//! |----------|-----------|
//! | `/api/v1/organization` | `name`, `erpAccountId`, or `supportSiteId` |
//! | `/api/v1/user` | `email` |
//!
//! # Response Handling
//!
//! - `404` → empty result (no matches is a normal outcome)
//! - `403` → [`LookupError::AccessRestricted`]
//! - other non-2xx, transport errors, non-array bodies → [`LookupError::FetchFailed`]
//! - `2xx` → JSON array of records, normalized into [`Organization`] / [`User`]
//!
//! Records that fail boundary validation (no `orgId`, no `emailAddress`) are
//! dropped with a warning instead of failing the whole query. Nothing is retried.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::LookupError;
use crate::models::{ApiUser, Organization, SearchType, User};

pub const ORGANIZATION_RESOURCE: &str = "organization";
pub const USER_RESOURCE: &str = "user";

/// The two lookups the orchestrator needs from the API.
///
/// [`ApiClient`] is the production implementation; tests substitute fakes.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Query organizations by one field. Every returned record is tagged
    /// with `field` in `matched_search_type`.
    async fn query_organizations(
        &self,
        term: &str,
        field: SearchType,
    ) -> Result<Vec<Organization>, LookupError>;

    /// Query users by email address.
    async fn query_users(&self, email: &str) -> Result<Vec<User>, LookupError>;
}

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// Applies `timeout_secs` when set and attaches the session cookie (if
    /// any) to every request.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(cookie) = config.effective_session_cookie() {
            let mut value = HeaderValue::from_str(cookie.trim())
                .context("session cookie is not a valid header value")?;
            value.set_sensitive(true);
            let mut headers = HeaderMap::new();
            headers.insert(COOKIE, value);
            builder = builder.default_headers(headers);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of an API resource, e.g. `https://host/api/v1/organization`.
    pub fn endpoint(&self, resource: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, resource)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    async fn fetch_records(
        &self,
        resource: &str,
        param: &str,
        value: &str,
    ) -> Result<Vec<Value>, LookupError> {
        let response = self
            .http
            .get(self.endpoint(resource))
            .query(&[(param, value)])
            .send()
            .await?;

        tracing::debug!(
            resource,
            param,
            status = response.status().as_u16(),
            "api response"
        );

        handle_response(response).await
    }
}

/// Map a response to records according to the status policy above.
async fn handle_response(response: reqwest::Response) -> Result<Vec<Value>, LookupError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Ok(Vec::new());
    }
    if status == StatusCode::FORBIDDEN {
        return Err(LookupError::AccessRestricted);
    }
    if !status.is_success() {
        return Err(LookupError::FetchFailed(format!("HTTP {}", status)));
    }

    let body: Value = response.json().await?;
    match body {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(LookupError::FetchFailed(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize raw organization records, dropping ones without an id.
pub fn parse_organizations(records: Vec<Value>, field: SearchType) -> Vec<Organization> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Organization>(record) {
            Ok(mut org) => {
                org.matched_search_type = Some(field);
                Some(org)
            }
            Err(e) => {
                tracing::warn!(%field, error = %e, "dropping malformed organization record");
                None
            }
        })
        .collect()
}

/// Normalize raw user records, dropping ones without an email address.
pub fn parse_users(records: Vec<Value>) -> Vec<User> {
    records
        .into_iter()
        .filter_map(|record| {
            match serde_json::from_value::<ApiUser>(record).map(ApiUser::normalize) {
                Ok(Some(user)) => Some(user),
                Ok(None) => {
                    tracing::warn!("dropping user record without emailAddress");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed user record");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl DirectoryApi for ApiClient {
    async fn query_organizations(
        &self,
        term: &str,
        field: SearchType,
    ) -> Result<Vec<Organization>, LookupError> {
        let records = self
            .fetch_records(ORGANIZATION_RESOURCE, field.query_param(), term)
            .await?;
        Ok(parse_organizations(records, field))
    }

    async fn query_users(&self, email: &str) -> Result<Vec<User>, LookupError> {
        let records = self.fetch_records(USER_RESOURCE, "email", email).await?;
        Ok(parse_users(records))
    }
}
