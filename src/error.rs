//! Errors that reach the user-visible channel.
//!
//! Only two failures are ever surfaced: the API refused access (HTTP 403,
//! usually because the request did not come through the VPN) and everything
//! else that kept a query from producing results. Unauthorized responses,
//! empty results, and cache failures are absorbed before they get here.

use thiserror::Error;

/// A failed remote lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// HTTP 403 from the API.
    #[error("Access restricted by the API (HTTP 403). Connect to the VPN and try again.")]
    AccessRestricted,

    /// Any other non-success status, transport failure, or unreadable body.
    #[error("Failed to fetch data: {0}")]
    FetchFailed(String),
}

impl LookupError {
    pub fn is_access_restricted(&self) -> bool {
        matches!(self, LookupError::AccessRestricted)
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::FetchFailed(err.to_string())
    }
}
