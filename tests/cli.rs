//! End-to-end tests of the `orgl` binary.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::{dead_port, spawn_api};

fn setup_test_env(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let cache_path = tmp.path().join("data").join("orgl.sqlite");
    let config_path = write_config(tmp.path(), base_url, &cache_path);
    (tmp, config_path)
}

fn write_config(root: &Path, base_url: &str, cache_path: &Path) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[api]
base_url = "{}"
signon_url = "https://signon.example.com"
timeout_secs = 5

[cache]
path = "{}"
key_prefix = "bml"
"#,
        base_url,
        cache_path.display()
    );

    let config_path = config_dir.join("orgl.toml");
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn offline_env() -> (TempDir, PathBuf) {
    setup_test_env(&format!("http://127.0.0.1:{}", dead_port()))
}

fn run_orgl(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = env!("CARGO_BIN_EXE_orgl");
    let output = Command::new(binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("ORGL_SESSION_COOKIE")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run orgl binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_login_prints_signon_url() {
    let (_tmp, config_path) = offline_env();
    let (stdout, stderr, success) = run_orgl(&config_path, &["login"]);
    assert!(success, "login failed: {}", stderr);
    assert!(stdout
        .trim()
        .starts_with("https://signon.example.com/signon/login.html?redirectUrl="));
}

#[test]
fn test_status_unreachable_is_not_authenticated() {
    let (_tmp, config_path) = offline_env();
    let (stdout, stderr, success) = run_orgl(&config_path, &["status"]);
    assert!(success, "status failed: {}", stderr);
    assert!(stdout.contains("not authenticated"));
}

#[test]
fn test_blank_term_is_skipped() {
    let (_tmp, config_path) = offline_env();
    let (stdout, _, success) = run_orgl(&config_path, &["orgs", "   ", "--offline"]);
    assert!(success);
    assert!(stdout.contains("Nothing to search for."));

    let (stdout, _, success) = run_orgl(&config_path, &["users", "", "--offline"]);
    assert!(success);
    assert!(stdout.contains("Nothing to search for."));
}

#[test]
fn test_empty_cache_reports_no_cached_data() {
    let (_tmp, config_path) = offline_env();
    let (stdout, stderr, success) = run_orgl(&config_path, &["orgs", "acme"]);
    assert!(success, "orgs failed: {}", stderr);
    assert!(stdout.contains("No cached results found"));

    let (stdout, _, _) = run_orgl(&config_path, &["cache", "list"]);
    assert!(stdout.contains("Cache is empty."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_live_results_are_cached_for_offline_use() {
    let api = spawn_api(|resource, params, _| match resource {
        "organization" if params.get("name").map(String::as_str) == Some("acme") => (
            StatusCode::OK,
            json!([{ "orgId": "1", "displayName": "Acme Corp", "server": "app-01.example.com", "erpAccountId": "E1" }]),
        ),
        "organization" if params.get("name").map(String::as_str) == Some("test") => {
            (StatusCode::OK, json!([]))
        }
        _ => (StatusCode::NOT_FOUND, json!({})),
    })
    .await;
    let (_tmp, config_path) = setup_test_env(&api.base_url);

    let (stdout, stderr, success) = run_orgl(&config_path, &["orgs", "acme"]);
    assert!(success, "live search failed: {}", stderr);
    assert!(stdout.contains("Acme Corp"));
    assert!(stdout.contains("https://app-01.example.com/pvc/?st=1"));
    assert!(!stdout.contains("Showing cached results"));

    let (stdout, _, success) = run_orgl(&config_path, &["orgs", "E1", "--offline", "--json"]);
    assert!(success);
    let body: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["status"], "found");
    assert_eq!(body["fromCache"], true);
    assert_eq!(body["results"][0]["orgId"], "1");
    assert_eq!(body["results"][0]["matchedSearchType"], "name");

    let (stdout, _, _) = run_orgl(&config_path, &["cache", "list"]);
    assert!(stdout.contains("org_acme"));

    let (stdout, _, success) = run_orgl(&config_path, &["cache", "clear"]);
    assert!(success);
    assert!(stdout.contains("Removed 1 cached searches."));

    let (stdout, _, _) = run_orgl(&config_path, &["orgs", "acme", "--offline"]);
    assert!(stdout.contains("No cached results found"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_access_restricted_exits_with_error() {
    let api = spawn_api(|_, params, _| {
        if params.get("name").map(String::as_str) == Some("test") {
            (StatusCode::OK, json!([]))
        } else {
            (StatusCode::FORBIDDEN, json!({}))
        }
    })
    .await;
    let (_tmp, config_path) = setup_test_env(&api.base_url);

    let (_, stderr, success) = run_orgl(&config_path, &["users", "jane@example.com"]);
    assert!(!success);
    assert!(stderr.contains("VPN"), "stderr: {}", stderr);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unopenable_cache_does_not_block_live_search() {
    let api = spawn_api(|resource, params, _| match resource {
        "organization" if params.get("name").map(String::as_str) == Some("acme") => (
            StatusCode::OK,
            json!([{ "orgId": "1", "displayName": "Acme Corp", "server": "app-01.example.com" }]),
        ),
        "organization" => (StatusCode::OK, json!([])),
        _ => (StatusCode::NOT_FOUND, json!({})),
    })
    .await;

    // A regular file where the cache directory should be.
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let config_path = write_config(tmp.path(), &api.base_url, &blocker.join("orgl.sqlite"));

    let (stdout, stderr, success) = run_orgl(&config_path, &["orgs", "acme"]);
    assert!(success, "live search failed: {}", stderr);
    assert!(stdout.contains("Acme Corp"));
    assert!(stderr.contains("Failed to open cache at"), "stderr: {}", stderr);
    assert!(stderr.contains("blocker"), "stderr: {}", stderr);
}
