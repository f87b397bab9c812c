//! # Org Lookup
//!
//! Search an organization-management API for organizations and users, with a
//! local result cache that answers searches when no session is available.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌────────────┐
//!                    │ Auth Probe │  one GET, 401 or error → offline
//!                    └─────┬──────┘
//!                          ▼
//! ┌─────────┐   ┌────────────────────┐   ┌──────────────┐
//! │   CLI   │──▶│  Search Orchestr.  │──▶│ Remote Query │  3× org / 1× user
//! │ (orgl)  │   │   merge + dedup    │   │    Client    │
//! └────▲────┘   └───┬──────────▲─────┘   └──────────────┘
//!      │            │ put      │ scan
//!      │            ▼          │
//!      │      ┌─────────────────────┐
//!      │      │ Cache (SQLite / mem)│
//!      │      └─────────────────────┘
//!      └── render (table / cards / JSON)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! orgl status                      # is the session still valid?
//! orgl orgs acme                   # live search, falls back to cache when signed out
//! orgl users jane@example.com
//! orgl orgs acme --offline         # cache only
//! orgl cache list
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Organization and user records |
//! | [`error`] | User-visible lookup errors |
//! | [`client`] | Remote query client |
//! | [`auth`] | Session probe and sign-on link |
//! | [`cache`] | Key/value result cache |
//! | [`cache_search`] | Offline search over cached results |
//! | [`merge`] | Keyed result deduplication |
//! | [`search`] | Search orchestration |
//! | [`render`] | Terminal and JSON output |
//! | [`logging`] | Log subscriber setup |

pub mod auth;
pub mod cache;
pub mod cache_search;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod models;
pub mod render;
pub mod search;
