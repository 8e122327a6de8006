use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Largest row limit the Search Analytics API accepts per request.
pub const MAX_ROW_LIMIT: u32 = 25_000;

/// Application configuration loaded from environment variables or TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to a service account key (JSON) with read access to the properties.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    /// Pre-issued OAuth bearer token. Takes precedence over `credentials_path`.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Base URL of the Search Console API (overridable for tests and proxies).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Maximum rows requested per site query.
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,
    /// Skip properties the account is not a verified user of.
    #[serde(default = "default_verified_only")]
    pub verified_only: bool,
    /// How long a fetched table is reused before the API is queried again.
    /// 0 = no caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Timeout for each outbound API call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Dashboard origin for CORS restrictions on API routes.
    /// If not set, all origins are allowed.
    #[serde(default)]
    pub dashboard_origin: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8501
}

fn default_api_base() -> String {
    "https://www.googleapis.com/webmasters/v3/".to_string()
}

const fn default_row_limit() -> u32 {
    5000
}

const fn default_verified_only() -> bool {
    true
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            credentials_path: None,
            access_token: None,
            api_base: default_api_base(),
            row_limit: default_row_limit(),
            verified_only: default_verified_only(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            dashboard_origin: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Environment variables override file values:
    /// - `GSC_HOST` → host
    /// - `GSC_PORT` → port
    /// - `GSC_CREDENTIALS` → credentials_path
    /// - `GSC_ACCESS_TOKEN` → access_token
    /// - `GSC_API_BASE` → api_base
    /// - `GSC_ROW_LIMIT` → row_limit
    /// - `GSC_VERIFIED_ONLY` → verified_only
    /// - `GSC_CACHE_TTL` → cache_ttl_secs
    /// - `GSC_REQUEST_TIMEOUT` → request_timeout_secs
    /// - `GSC_DASHBOARD_ORIGIN` → dashboard_origin
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config =
            config_path.map_or_else(Self::default, |path| match std::fs::read_to_string(path) {
                Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file: {e}, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read config file: {e}, using defaults");
                    Self::default()
                }
            });

        if let Ok(host) = std::env::var("GSC_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("GSC_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(path) = std::env::var("GSC_CREDENTIALS") {
            config.credentials_path = Some(PathBuf::from(path));
        }
        if let Ok(token) = std::env::var("GSC_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                config.access_token = Some(token);
            }
        }
        if let Ok(base) = std::env::var("GSC_API_BASE") {
            config.api_base = base;
        }
        if let Ok(val) = std::env::var("GSC_ROW_LIMIT") {
            if let Ok(l) = val.parse() {
                config.row_limit = l;
            }
        }
        if let Ok(val) = std::env::var("GSC_VERIFIED_ONLY") {
            config.verified_only = val != "0" && val.to_lowercase() != "false";
        }
        if let Ok(val) = std::env::var("GSC_CACHE_TTL") {
            if let Ok(t) = val.parse() {
                config.cache_ttl_secs = t;
            }
        }
        if let Ok(val) = std::env::var("GSC_REQUEST_TIMEOUT") {
            if let Ok(t) = val.parse() {
                config.request_timeout_secs = t;
            }
        }
        if let Ok(origin) = std::env::var("GSC_DASHBOARD_ORIGIN") {
            config.dashboard_origin = Some(origin);
        }

        config
    }

    /// Row limit clamped to what the API accepts.
    pub fn effective_row_limit(&self) -> u32 {
        self.row_limit.clamp(1, MAX_ROW_LIMIT)
    }

    /// Returns the address the dashboard server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serializes tests that call `Config::load`, which reads environment
    /// variables shared across the test process.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8501);
        assert!(config.credentials_path.is_none());
        assert!(config.access_token.is_none());
        assert_eq!(config.api_base, "https://www.googleapis.com/webmasters/v3/");
        assert_eq!(config.row_limit, 5000);
        assert!(config.verified_only);
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.dashboard_origin.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        write!(
            file,
            r#"
host = "0.0.0.0"
port = 9000
credentials_path = "/etc/gsc/key.json"
api_base = "http://localhost:1234/"
row_limit = 1000
verified_only = false
cache_ttl_secs = 0
request_timeout_secs = 10
dashboard_origin = "https://seo.example.com"
"#
        )
        .unwrap();

        let config = Config::load(Some(&config_path));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.credentials_path,
            Some(PathBuf::from("/etc/gsc/key.json"))
        );
        assert_eq!(config.api_base, "http://localhost:1234/");
        assert_eq!(config.row_limit, 1000);
        assert!(!config.verified_only);
        assert_eq!(config.cache_ttl_secs, 0);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(
            config.dashboard_origin.as_deref(),
            Some("https://seo.example.com")
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert_eq!(config.row_limit, 5000);
    }

    #[test]
    fn test_invalid_toml_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "this is not valid toml {{{").unwrap();

        let config = Config::load(Some(&config_path));
        assert_eq!(config.port, 8501);
    }

    #[test]
    fn test_env_var_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();

        let orig = std::env::var("GSC_ROW_LIMIT").ok();

        std::env::set_var("GSC_ROW_LIMIT", "1000");
        let config = Config::load(None);
        assert_eq!(config.row_limit, 1000);

        match orig {
            Some(v) => std::env::set_var("GSC_ROW_LIMIT", v),
            None => std::env::remove_var("GSC_ROW_LIMIT"),
        }
    }

    #[test]
    fn test_effective_row_limit_clamped() {
        let high = Config {
            row_limit: 100_000,
            ..Config::default()
        };
        assert_eq!(high.effective_row_limit(), MAX_ROW_LIMIT);

        let zero = Config {
            row_limit: 0,
            ..Config::default()
        };
        assert_eq!(zero.effective_row_limit(), 1);
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8501");
    }
}
