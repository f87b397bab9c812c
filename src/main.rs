//! # Org Lookup CLI (`orgl`)
//!
//! ```bash
//! orgl --config ./config/orgl.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `orgl status` | Check whether the current session is authenticated |
//! | `orgl orgs <term>` | Search organizations by name, ERP account id, or support site id |
//! | `orgl users <email>` | Search users by email address |
//! | `orgl login` | Print the sign-on URL |
//! | `orgl cache list` | List cached searches |
//! | `orgl cache clear` | Delete all cached searches |
//!
//! Without a valid session, `orgs` and `users` search the local cache of
//! earlier live results instead.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use org_lookup::auth;
use org_lookup::cache::{Cache, SqliteStore};
use org_lookup::client::ApiClient;
use org_lookup::config::{self, Config};
use org_lookup::logging;
use org_lookup::render;
use org_lookup::search::Searcher;

/// Org Lookup: search organizations and users, with an offline cache.
#[derive(Parser)]
#[command(name = "orgl", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply when absent.
    #[arg(long, global = true, default_value = "./config/orgl.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the API and report whether the session is authenticated.
    Status,

    /// Search organizations.
    ///
    /// The term is matched against name, ERP account id, and support site id
    /// in parallel. Live results are cached for later offline searches.
    Orgs {
        /// Free-text search term.
        term: String,

        /// Skip the session probe and search the cache only.
        #[arg(long)]
        offline: bool,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search users by email address.
    Users {
        /// Email address (offline: any part of a name or email).
        email: String,

        /// Skip the session probe and search the cache only.
        #[arg(long)]
        offline: bool,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the sign-on URL for starting a new session.
    Login,

    /// Inspect or clear the result cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached searches with record counts.
    List,
    /// Delete every cached search.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Status => {
            let client = ApiClient::new(&cfg.api)?;
            if auth::check_authenticated(&client, &cfg.api.probe_term).await {
                println!("authenticated");
            } else {
                println!("not authenticated");
                println!("Sign in at: {}", auth::login_url(&cfg.api)?);
            }
        }
        Commands::Orgs {
            term,
            offline,
            json,
        } => {
            let ok = run_search(&cfg, offline, |searcher, authenticated| async move {
                let outcome = searcher.search_organizations(&term, authenticated).await;
                render::print_outcome(&outcome, json)
            })
            .await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Users {
            email,
            offline,
            json,
        } => {
            let ok = run_search(&cfg, offline, |searcher, authenticated| async move {
                let outcome = searcher.search_users(&email, authenticated).await;
                render::print_outcome(&outcome, json)
            })
            .await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Login => {
            println!("{}", auth::login_url(&cfg.api)?);
        }
        Commands::Cache { action } => {
            let store = Arc::new(SqliteStore::open(&cfg.cache.path).await?);
            let cache = Cache::new(store.clone(), cfg.cache.key_prefix.clone());
            match action {
                CacheAction::List => list_cache(&cache).await?,
                CacheAction::Clear => {
                    let removed = cache.clear().await?;
                    println!("Removed {} cached searches.", removed);
                }
            }
            store.close().await;
        }
    }

    Ok(())
}

/// Open the cache, probe the session unless offline, and run one search.
async fn run_search<F, Fut>(cfg: &Config, offline: bool, search: F) -> anyhow::Result<bool>
where
    F: FnOnce(Arc<Searcher>, bool) -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let client = ApiClient::new(&cfg.api)?;
    let prefix = cfg.cache.key_prefix.clone();
    let (cache, store) = match SqliteStore::open(&cfg.cache.path).await {
        Ok(store) => {
            let store = Arc::new(store);
            (Cache::new(store.clone(), prefix), Some(store))
        }
        Err(e) => {
            tracing::warn!("{:#}; results will not be cached", e);
            (Cache::in_memory(prefix), None)
        }
    };

    let authenticated = if offline {
        false
    } else {
        auth::check_authenticated(&client, &cfg.api.probe_term).await
    };

    let searcher = Arc::new(Searcher::new(Arc::new(client), cache));
    let ok = search(searcher, authenticated).await;

    if let Some(store) = store {
        store.close().await;
    }
    Ok(ok)
}

async fn list_cache(cache: &Cache) -> anyhow::Result<()> {
    let entries = cache.entries().await?;
    if entries.is_empty() {
        println!("Cache is empty.");
        return Ok(());
    }

    println!("{:<40} {:>8}  UPDATED", "KEY", "RECORDS");
    for entry in entries {
        let records = cache
            .get::<Vec<serde_json::Value>>(&entry.key)
            .await
            .map(|v| v.len().to_string())
            .unwrap_or_else(|| "?".to_string());
        let updated = chrono::DateTime::from_timestamp(entry.updated_at, 0)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| entry.updated_at.to_string());
        println!("{:<40} {:>8}  {}", entry.key, records, updated);
    }
    Ok(())
}
