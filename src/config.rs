use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.session_cookie`.
pub const SESSION_COOKIE_ENV: &str = "ORGL_SESSION_COOKIE";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_signon_url")]
    pub signon_url: String,
    /// Dummy `name` value sent by the auth probe.
    #[serde(default = "default_probe_term")]
    pub probe_term: String,
    /// Request timeout. Unset leaves the transport default in place.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Cookie header of an existing session, e.g. `JSESSIONID=...`.
    #[serde(default)]
    pub session_cookie: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            signon_url: default_signon_url(),
            probe_term: default_probe_term(),
            timeout_secs: None,
            session_cookie: None,
        }
    }
}

fn default_base_url() -> String {
    "https://provision.pm.appneta.com".to_string()
}
fn default_signon_url() -> String {
    "https://signon.pm.appneta.com".to_string()
}
fn default_probe_term() -> String {
    "test".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/orgl.sqlite")
}
fn default_key_prefix() -> String {
    "bml".to_string()
}

impl ApiConfig {
    /// Session cookie from the environment, falling back to the config file.
    pub fn effective_session_cookie(&self) -> Option<String> {
        std::env::var(SESSION_COOKIE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.session_cookie.clone())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the config file if it exists, otherwise use built-in defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    check_http_url("api.base_url", &config.api.base_url)?;
    check_http_url("api.signon_url", &config.api.signon_url)?;

    if config.api.timeout_secs == Some(0) {
        bail!("api.timeout_secs must be > 0");
    }
    if config.api.probe_term.trim().is_empty() {
        bail!("api.probe_term must not be empty");
    }
    if config.cache.key_prefix.is_empty() {
        bail!("cache.key_prefix must not be empty");
    }

    Ok(())
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    let url = reqwest::Url::parse(value)
        .with_context(|| format!("{} is not a valid URL: '{}'", field, value))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("{} must use http or https, got '{}'", field, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.api.base_url, "https://provision.pm.appneta.com");
        assert_eq!(cfg.api.probe_term, "test");
        assert_eq!(cfg.cache.key_prefix, "bml");
        assert!(cfg.api.timeout_secs.is_none());
    }

    #[test]
    fn test_overrides() {
        let file = write_config(
            r#"
[api]
base_url = "http://127.0.0.1:9000"
timeout_secs = 5

[cache]
path = "/tmp/orgl-test.sqlite"
key_prefix = "t"
"#,
        );
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.api.timeout_secs, Some(5));
        assert_eq!(cfg.cache.key_prefix, "t");
        assert_eq!(cfg.cache.path, PathBuf::from("/tmp/orgl-test.sqlite"));
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let file = write_config("[api]\nbase_url = \"ftp://example.com\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let file = write_config("[api]\ntimeout_secs = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_rejects_empty_prefix() {
        let file = write_config("[cache]\nkey_prefix = \"\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.cache.key_prefix, "bml");
    }
}
