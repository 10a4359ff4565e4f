//! Fetcher configuration
//!
//! A `FetcherConfig` describes one tracker site: where it lives, how to
//! authenticate, and how hard to retry. It is usually loaded from YAML:
//!
//! ```yaml
//! base_url: https://example.atlassian.net
//! credentials:
//!   type: basic
//!   username: admin@example.com
//!   password_env: TRACKER_API_TOKEN
//! retry:
//!   max_attempts: 5
//!   base_delay_ms: 2000
//!   backoff: linear
//! error_strategy: skip
//! concurrency: 4
//! ```

use crate::auth::Credentials;
use crate::engine::Fetcher;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, HttpTransportConfig, RateLimiterConfig};
use crate::retry::RetryPolicy;
use crate::types::{BackoffType, ErrorStrategy, StringMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Base URL for relative endpoint paths
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: StringMap,

    /// Credentials
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Client-side rate limit (`null` disables it)
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,

    /// What to do when a page or sub-fetch fails
    #[serde(default)]
    pub error_strategy: ErrorStrategy,

    /// Maximum concurrent sub-fetches
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

fn default_concurrency() -> usize {
    1
}

impl FetcherConfig {
    /// Config for a site with every other setting at its default
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            headers: StringMap::new(),
            credentials: CredentialsConfig::default(),
            retry: RetryConfig::default(),
            rate_limit: default_rate_limit(),
            error_strategy: ErrorStrategy::default(),
            concurrency: default_concurrency(),
        }
    }

    /// Parse and validate a YAML config
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Check the settings that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        url::Url::parse(&self.base_url)?;

        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1"));
        }
        if let Some(ref limit) = self.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::config(
                    "rate_limit.requests_per_second must be greater than zero",
                ));
            }
        }
        Ok(())
    }

    /// Resolve credentials, reading secrets from the environment if asked
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials.resolve()
    }

    /// Transport settings
    pub fn transport_config(&self) -> Result<HttpTransportConfig> {
        let mut builder = HttpTransportConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .credentials(self.credentials()?);

        builder = match self.rate_limit {
            Some(ref limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        if let Some(ref agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        Ok(builder.build())
    }

    /// Retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }

    /// Build a fetcher over a new HTTP transport
    pub fn build(&self) -> Result<Fetcher> {
        self.validate()?;
        let transport = HttpTransport::with_config(self.transport_config()?)?;

        Ok(Fetcher::new(transport)
            .with_retry_policy(self.retry_policy())
            .with_error_strategy(self.error_strategy)
            .with_concurrency(self.concurrency))
    }
}

// ============================================================================
// Credentials Config
// ============================================================================

/// Credentials as written in config
///
/// Secrets may be given inline or as the name of an environment variable.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsConfig {
    /// No credentials
    #[default]
    None,

    /// HTTP Basic (user name and API token)
    Basic {
        /// User name
        username: String,
        /// Password or API token
        #[serde(default)]
        password: Option<String>,
        /// Environment variable holding the password
        #[serde(default)]
        password_env: Option<String>,
    },

    /// Bearer token
    Bearer {
        /// Token
        #[serde(default)]
        token: Option<String>,
        /// Environment variable holding the token
        #[serde(default)]
        token_env: Option<String>,
    },

    /// Fixed headers
    Headers {
        /// Header names and values
        headers: StringMap,
    },
}

impl CredentialsConfig {
    /// Turn into `Credentials`
    pub fn resolve(&self) -> Result<Credentials> {
        match self {
            Self::None => Ok(Credentials::None),
            Self::Basic {
                username,
                password,
                password_env,
            } => {
                let password = secret(password, password_env, "credentials.password")?;
                Ok(Credentials::basic(username, password))
            }
            Self::Bearer { token, token_env } => {
                let token = secret(token, token_env, "credentials.token")?;
                Ok(Credentials::bearer(token))
            }
            Self::Headers { headers } => Ok(Credentials::Headers(headers.clone())),
        }
    }
}

fn secret(inline: &Option<String>, env: &Option<String>, field: &str) -> Result<String> {
    if let Some(value) = inline {
        return Ok(value.clone());
    }
    let Some(name) = env else {
        return Err(Error::missing_field(field));
    };
    std::env::var(name)
        .map_err(|_| Error::config(format!("environment variable {name} is not set")))
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic {
                username,
                password_env,
                ..
            } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password_env", password_env)
                .finish_non_exhaustive(),
            Self::Bearer { token_env, .. } => f
                .debug_struct("Bearer")
                .field("token_env", token_env)
                .finish_non_exhaustive(),
            Self::Headers { headers } => f
                .debug_struct("Headers")
                .field("names", &headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

// ============================================================================
// Retry Config
// ============================================================================

/// Retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per HTTP call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on computed delays in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Backoff shape
    #[serde(default)]
    pub backoff: BackoffType,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff: BackoffType::default(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

impl RetryConfig {
    /// Build the matching policy
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(self.max_attempts)
            .with_backoff(
                self.backoff,
                Duration::from_millis(self.base_delay_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_minimal_config_defaults() {
        let config =
            FetcherConfig::from_yaml_str("base_url: https://example.atlassian.net").unwrap();

        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.rate_limit, Some(RateLimiterConfig::default()));
        assert_eq!(config.error_strategy, ErrorStrategy::Fail);
        assert_eq!(config.concurrency, 1);
        assert!(config.credentials().unwrap().is_none());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_full_config() {
        let yaml = r"
base_url: https://example.atlassian.net
timeout_secs: 30
user_agent: admin-report/2.0
headers:
  X-ExperimentalApi: opt-in
credentials:
  type: basic
  username: admin@example.com
  password: api-token
retry:
  max_attempts: 3
  base_delay_ms: 500
  backoff: exponential
rate_limit:
  requests_per_second: 2
error_strategy: skip
concurrency: 4
";
        let config = FetcherConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.max_backoff_ms, 60_000);
        assert_eq!(config.retry.backoff, BackoffType::Exponential);
        assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(2, 1)));
        assert_eq!(config.error_strategy, ErrorStrategy::Skip);

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.calculate_backoff(3), Duration::from_secs(2));

        let transport = config.transport_config().unwrap();
        assert_eq!(transport.timeout, Duration::from_secs(30));
        assert_eq!(transport.user_agent, "admin-report/2.0");
        assert_eq!(
            transport.default_headers.get("X-ExperimentalApi"),
            Some(&"opt-in".to_string())
        );
        assert_eq!(
            transport.credentials,
            Credentials::basic("admin@example.com", "api-token")
        );

        let fetcher = config.build().unwrap();
        assert_eq!(fetcher.concurrency(), 4);
        assert_eq!(fetcher.error_strategy(), ErrorStrategy::Skip);
    }

    #[test]
    fn test_rate_limit_can_be_disabled() {
        let config =
            FetcherConfig::from_yaml_str("base_url: https://example.atlassian.net\nrate_limit: null")
                .unwrap();
        assert!(config.rate_limit.is_none());
        assert!(config.transport_config().unwrap().rate_limit.is_none());
    }

    #[test]
    fn test_bearer_from_environment() {
        std::env::set_var("TRACKER_FETCH_TEST_TOKEN", "from-env");
        let config = FetcherConfig::from_yaml_str(
            "base_url: https://example.atlassian.net\ncredentials:\n  type: bearer\n  token_env: TRACKER_FETCH_TEST_TOKEN",
        )
        .unwrap();

        assert_eq!(config.credentials().unwrap(), Credentials::bearer("from-env"));
    }

    #[test]
    fn test_missing_secrets() {
        let config = FetcherConfig::from_yaml_str(
            "base_url: https://example.atlassian.net\ncredentials:\n  type: basic\n  username: a",
        )
        .unwrap();
        assert!(matches!(
            config.credentials().unwrap_err(),
            Error::MissingConfigField { .. }
        ));

        let config = FetcherConfig::from_yaml_str(
            "base_url: https://example.atlassian.net\ncredentials:\n  type: bearer\n  token_env: TRACKER_FETCH_UNSET_VARIABLE",
        )
        .unwrap();
        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains("TRACKER_FETCH_UNSET_VARIABLE"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credentials = CredentialsConfig::Basic {
            username: "admin".to_string(),
            password: Some("hunter2".to_string()),
            password_env: None,
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            FetcherConfig::from_yaml_str("base_url: ''").unwrap_err(),
            Error::MissingConfigField { .. }
        ));
        assert!(matches!(
            FetcherConfig::from_yaml_str("base_url: not a url").unwrap_err(),
            Error::InvalidUrl(_)
        ));
        assert!(matches!(
            FetcherConfig::from_yaml_str("timeout_secs: 5").unwrap_err(),
            Error::YamlParse(_)
        ));
        assert!(FetcherConfig::from_yaml_str(
            "base_url: https://example.atlassian.net\nconcurrency: 0"
        )
        .is_err());
        assert!(FetcherConfig::from_yaml_str(
            "base_url: https://example.atlassian.net\nretry:\n  max_attempts: 0"
        )
        .is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: https://example.atlassian.net").unwrap();
        writeln!(file, "error_strategy: skip").unwrap();

        let config = FetcherConfig::from_file(file.path()).unwrap();
        assert_eq!(config.error_strategy, ErrorStrategy::Skip);

        let err = FetcherConfig::from_file("/nonexistent/tracker.yaml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_new_matches_yaml_defaults() {
        let from_yaml = FetcherConfig::from_yaml_str("base_url: https://x.example").unwrap();
        let from_new = FetcherConfig::new("https://x.example");
        assert_eq!(from_new.retry, from_yaml.retry);
        assert_eq!(from_new.rate_limit, from_yaml.rate_limit);
        assert_eq!(from_new.concurrency, from_yaml.concurrency);
    }
}
