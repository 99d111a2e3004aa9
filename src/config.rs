//! Configuration types for tm-task-filter

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Public Tasking Manager production API
pub const DEFAULT_API_BASE_URL: &str = "https://tasking-manager-production-api.hotosm.org";

/// Default cap on concurrently outstanding task detail fetches
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 10;

/// Main configuration for [`TaskFilter`](crate::TaskFilter)
///
/// Every field has a default, so an empty JSON object (`{}`) is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Tasking Manager API (default: the HOT production API)
    ///
    /// Endpoint paths (`/api/v2/projects/...`) are appended to this URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Maximum number of task detail requests in flight at once (default: 10)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Timeout for a single HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults. The loaded config is validated.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or fails
    /// [`validate`](Self::validate).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Check that every setting is usable
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the first unusable setting.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.max_concurrent_fetches == 0 {
            return Err(Error::config("max_concurrent_fetches", "must be at least 1"));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::config("request_timeout", "must be greater than zero"));
        }

        Ok(())
    }

    /// Parse `api_base_url`, normalized so that relative endpoint paths join under it
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the URL is empty, unparseable, or not http(s).
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.api_base_url.trim();
        if trimmed.is_empty() {
            return Err(Error::config("api_base_url", "must not be empty"));
        }

        let mut url = Url::parse(trimmed)
            .map_err(|e| Error::config("api_base_url", format!("{trimmed:?}: {e}")))?;

        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "api_base_url",
                format!("{trimmed:?} is not an http(s) base URL"),
            ));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_max_concurrent_fetches() -> usize {
    DEFAULT_MAX_CONCURRENT_FETCHES
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("tm-task-filter/", env!("CARGO_PKG_VERSION")).to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");
        assert_eq!(config, Config::default());
        assert_eq!(config.max_concurrent_fetches, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_request_timeout_serialized_as_seconds() {
        let config = Config {
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["request_timeout"], 5);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = Config {
            api_base_url: "http://localhost:8080/tm".to_string(),
            ..Default::default()
        };
        let url = config.base_url().unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/tm/");
        assert_eq!(
            url.join("api/v2/projects/1/tasks/").unwrap().as_str(),
            "http://localhost:8080/tm/api/v2/projects/1/tasks/"
        );
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let zero_concurrency = Config {
            max_concurrent_fetches: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_concurrency.validate(),
            Err(Error::Config { key: Some(ref k), .. }) if k == "max_concurrent_fetches"
        ));

        let zero_timeout = Config {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        for bad in ["", "   ", "not a url", "ftp://example.com", "mailto:a@b.c"] {
            let config = Config {
                api_base_url: bad.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_from_file_merges_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_concurrent_fetches": 4}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.max_concurrent_fetches, 4);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_from_file_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_concurrent_fetches": 0}}"#).unwrap();

        assert!(matches!(
            Config::from_file(file.path()),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            Config::from_file("/definitely/not/here.json"),
            Err(Error::Io(_))
        ));
    }
}
