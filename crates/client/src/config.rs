use std::time::Duration;

/// Default base URL of the conversion service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Default path of the conversion endpoint.
pub const DEFAULT_PROCESS_PATH: &str = "/process";

/// Errors raised while loading [`ServiceConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Where the conversion service lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL without trailing slash (default: `http://localhost:8000`).
    pub base_url: String,
    /// Conversion endpoint path, always starting with `/` (default: `/process`).
    pub process_path: String,
    /// Transport-level request timeout. `None` leaves reqwest's default
    /// (no timeout) in place.
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            process_path: DEFAULT_PROCESS_PATH.to_string(),
            request_timeout: None,
        }
    }
}

impl ServiceConfig {
    /// Build a config for `base_url` with the default endpoint path.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `SYMBOLART_SERVICE_URL`          | `http://localhost:8000` |
    /// | `SYMBOLART_PROCESS_PATH`         | `/process`              |
    /// | `SYMBOLART_REQUEST_TIMEOUT_SECS` | unset (no timeout)      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("SYMBOLART_SERVICE_URL")
            .map(|v| normalize_base_url(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "SYMBOLART_SERVICE_URL",
                expected: "an http(s) URL",
                value: base_url,
            });
        }

        let process_path = lookup("SYMBOLART_PROCESS_PATH")
            .map(|v| normalize_path(&v))
            .unwrap_or_else(|| DEFAULT_PROCESS_PATH.to_string());

        let request_timeout = match lookup("SYMBOLART_REQUEST_TIMEOUT_SECS") {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "SYMBOLART_REQUEST_TIMEOUT_SECS",
                    expected: "a whole number of seconds",
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
        };

        Ok(Self {
            base_url,
            process_path,
            request_timeout,
        })
    }

    /// Full URL of the conversion endpoint.
    pub fn process_url(&self) -> String {
        format!("{}{}", self.base_url, self.process_path)
    }

    /// Full URL of the health probe.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_PROCESS_PATH.to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
