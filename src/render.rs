//! Terminal and JSON output for search outcomes.
//!
//! Results go to stdout; warnings and errors go to stderr.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Write;

use crate::models::{Organization, User};
use crate::search::{Origin, SearchOutcome};

const NAME_WIDTH: usize = 32;

/// Types that know how to lay themselves out as text.
pub trait RenderItems: Serialize + Sized {
    fn format_items(items: &[Self]) -> String;
}

impl RenderItems for Organization {
    fn format_items(items: &[Self]) -> String {
        format_organizations(items)
    }
}

impl RenderItems for User {
    fn format_items(items: &[Self]) -> String {
        format_users(items)
    }
}

/// Print an outcome. Returns `false` when the search failed.
pub fn print_outcome<T: RenderItems>(outcome: &SearchOutcome<T>, as_json: bool) -> bool {
    if as_json {
        match serde_json::to_string_pretty(&outcome_json(outcome)) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("error: could not encode results: {}", e),
        }
        return !matches!(outcome, SearchOutcome::Failed(_));
    }

    match outcome {
        SearchOutcome::Skipped => {
            println!("Nothing to search for.");
            true
        }
        SearchOutcome::Found {
            items,
            origin,
            partial_failures,
        } => {
            for failure in partial_failures {
                eprintln!(
                    "warning: {} query failed ({}); results may be incomplete",
                    failure.field, failure.error
                );
            }
            if items.is_empty() {
                println!("No results.");
            } else {
                print!("{}", T::format_items(items));
            }
            if *origin == Origin::Cache {
                println!();
                println!("Showing cached results. Run `orgl login` to sign in and refresh.");
            }
            true
        }
        SearchOutcome::NoCachedData => {
            println!("No cached results found. Log in to perform a live search.");
            true
        }
        SearchOutcome::Failed(e) => {
            eprintln!("error: {}", e);
            false
        }
    }
}

/// JSON form of an outcome, as printed by `--json`.
pub fn outcome_json<T: Serialize>(outcome: &SearchOutcome<T>) -> Value {
    match outcome {
        SearchOutcome::Skipped => json!({ "status": "skipped" }),
        SearchOutcome::Found {
            items,
            origin,
            partial_failures,
        } => {
            let warnings: Vec<Value> = partial_failures
                .iter()
                .map(|f| json!({ "field": f.field, "error": f.error.to_string() }))
                .collect();
            json!({
                "status": "found",
                "origin": origin,
                "fromCache": *origin == Origin::Cache,
                "results": items,
                "warnings": warnings,
            })
        }
        SearchOutcome::NoCachedData => json!({ "status": "no_cached_data", "results": [] }),
        SearchOutcome::Failed(e) => json!({
            "status": "error",
            "accessRestricted": e.is_access_restricted(),
            "error": e.to_string(),
        }),
    }
}

pub fn format_organizations(orgs: &[Organization]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<32} {:<10} {:<10} {:<24} {:<12} {:<12} {:<14} LINK",
        "DISPLAY NAME", "ORG ID", "PARENT ID", "SERVER", "ERP ID", "SUPPORT ID", "MATCHED"
    );
    for org in orgs {
        let _ = writeln!(
            out,
            "{:<32} {:<10} {:<10} {:<24} {:<12} {:<12} {:<14} {}",
            truncate(&org.display_name, NAME_WIDTH),
            org.org_id,
            org.parent_id.as_deref().unwrap_or(""),
            org.server,
            org.erp_account_id.as_deref().unwrap_or(""),
            org.support_site_id.as_deref().unwrap_or(""),
            org.matched_search_type
                .map(|t| t.to_string())
                .unwrap_or_default(),
            org.portal_url().unwrap_or_default(),
        );
    }
    out
}

pub fn format_users(users: &[User]) -> String {
    let mut out = String::new();
    for (i, user) in users.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", user.full_name());
        let _ = writeln!(out, "  Email:  {}", user.email_address);
        let _ = writeln!(out, "  Active: {}", if user.active { "Yes" } else { "No" });
        let _ = writeln!(out, "  Roles:  {}", user.roles.join(", "));
        let _ = writeln!(out, "  Organizations:");
        for membership in &user.memberships {
            let _ = writeln!(
                out,
                "    - {} (ID: {})",
                membership.organization.display_name, membership.organization.id
            );
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
