//! Session probe and sign-on link.
//!
//! The probe sends one read-only organization query with a dummy name and
//! looks only at the status code. It fails closed: HTTP 401 and any
//! transport failure both mean "not authenticated", and no error ever
//! reaches the caller.

use reqwest::StatusCode;

use crate::client::{ApiClient, ORGANIZATION_RESOURCE};
use crate::config::ApiConfig;

/// Classify the current session.
pub async fn check_authenticated(client: &ApiClient, probe_term: &str) -> bool {
    let result = client
        .http()
        .get(client.endpoint(ORGANIZATION_RESOURCE))
        .query(&[("name", probe_term)])
        .send()
        .await;

    match result {
        Ok(response) => {
            let authenticated = response.status() != StatusCode::UNAUTHORIZED;
            tracing::info!(
                status = response.status().as_u16(),
                authenticated,
                "session probe"
            );
            authenticated
        }
        Err(e) => {
            tracing::warn!(error = %e, "session probe failed, treating as not authenticated");
            false
        }
    }
}

/// Sign-on page that returns to the API host after login.
pub fn login_url(config: &ApiConfig) -> anyhow::Result<String> {
    let page = format!(
        "{}/signon/login.html",
        config.signon_url.trim_end_matches('/')
    );
    let url = reqwest::Url::parse_with_params(&page, &[("redirectUrl", config.base_url.as_str())])?;
    Ok(url.to_string())
}
