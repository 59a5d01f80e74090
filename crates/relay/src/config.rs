//! Relay configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::RelayError;
use crate::marker::DEFAULT_MARKER_PATH;

/// Profile whose page is polled.
pub const ENV_ACCOUNT: &str = "ACCOUNT_IDENTIFIER";
/// Endpoint receiving one JSON message per new post.
pub const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";
const ENV_MARKER_PATH: &str = "MARKER_PATH";
const ENV_BASE_URL: &str = "PROFILE_BASE_URL";
const ENV_SEND_DELAY_MS: &str = "SEND_DELAY_MS";
const ENV_NAVIGATION_TIMEOUT_SECS: &str = "NAVIGATION_TIMEOUT_SECS";
const ENV_USER_AGENT: &str = "BROWSER_USER_AGENT";
const ENV_FAILURE_POLICY: &str = "DELIVERY_FAILURE_POLICY";

/// Default site the profile lives on.
pub const DEFAULT_BASE_URL: &str = "https://mobile.twitter.com";

/// Default pause between two deliveries.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(400);

/// Default page navigation timeout.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(45);

/// Default browser user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// What a run does when one delivery fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the batch and keep the marker at the last delivered post.
    #[default]
    Halt,
    /// Log, move the marker past the failed post and keep going.
    Skip,
}

impl FailurePolicy {
    /// Parse a policy name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "halt" | "stop" => Some(Self::Halt),
            "skip" | "continue" => Some(Self::Skip),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Halt => "halt",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for a single relay run.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Profile identifier (handle) to poll.
    pub account: String,
    /// Webhook endpoint.
    pub webhook_url: String,
    /// Marker file location.
    pub marker_path: PathBuf,
    /// Site root; the profile lives at `{base_url}/{account}`.
    pub base_url: String,
    /// Pause between consecutive deliveries.
    pub send_delay: Duration,
    /// Page navigation timeout.
    pub navigation_timeout: Duration,
    /// Browser user agent.
    pub user_agent: String,
    /// Behaviour on delivery failure.
    pub failure_policy: FailurePolicy,
}

impl RelayConfig {
    /// Create a configuration with defaults for everything but the
    /// required settings.
    #[must_use]
    pub fn new(account: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            webhook_url: webhook_url.into(),
            marker_path: PathBuf::from(DEFAULT_MARKER_PATH),
            base_url: DEFAULT_BASE_URL.to_string(),
            send_delay: DEFAULT_SEND_DELAY,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Required Environment Variables
    /// - `ACCOUNT_IDENTIFIER`: profile to poll
    /// - `WEBHOOK_URL`: delivery endpoint
    ///
    /// # Optional Environment Variables
    /// - `MARKER_PATH` (default: ./last_id.txt)
    /// - `PROFILE_BASE_URL` (default: https://mobile.twitter.com)
    /// - `SEND_DELAY_MS` (default: 400)
    /// - `NAVIGATION_TIMEOUT_SECS` (default: 45)
    /// - `BROWSER_USER_AGENT`
    /// - `DELIVERY_FAILURE_POLICY`: `halt` or `skip` (default: halt)
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(RelayError::MissingConfig(key))
        };

        let mut config = Self::new(required(ENV_ACCOUNT)?, required(ENV_WEBHOOK_URL)?);

        if let Some(path) = lookup(ENV_MARKER_PATH).filter(|v| !v.trim().is_empty()) {
            config.marker_path = PathBuf::from(path.trim());
        }

        if let Some(base) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = base.trim().trim_end_matches('/').to_string();
        }

        if let Some(ms) = parse_or_warn::<u64, _>(&lookup, ENV_SEND_DELAY_MS) {
            config.send_delay = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_or_warn::<u64, _>(&lookup, ENV_NAVIGATION_TIMEOUT_SECS) {
            config.navigation_timeout = Duration::from_secs(secs);
        }

        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = agent;
        }

        if let Some(raw) = lookup(ENV_FAILURE_POLICY) {
            match FailurePolicy::parse(&raw) {
                Some(policy) => config.failure_policy = policy,
                None => tracing::warn!(
                    key = ENV_FAILURE_POLICY,
                    value = %raw,
                    default = %config.failure_policy,
                    "Unknown failure policy, using default"
                ),
            }
        }

        Ok(config)
    }

    /// URL of the polled profile page.
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!("{}/{}", self.base_url, self.account)
    }
}

fn parse_or_warn<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_required_settings() {
        let err = RelayConfig::from_lookup(lookup(&[(ENV_WEBHOOK_URL, "https://hook")]))
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingConfig(ENV_ACCOUNT)));

        let err = RelayConfig::from_lookup(lookup(&[(ENV_ACCOUNT, "someone")])).unwrap_err();
        assert!(matches!(err, RelayError::MissingConfig(ENV_WEBHOOK_URL)));

        let err = RelayConfig::from_lookup(lookup(&[
            (ENV_ACCOUNT, "   "),
            (ENV_WEBHOOK_URL, "https://hook"),
        ]))
        .unwrap_err();
        assert!(matches!(err, RelayError::MissingConfig(ENV_ACCOUNT)));
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[
            (ENV_ACCOUNT, "someone"),
            (ENV_WEBHOOK_URL, "https://hook"),
        ]))
        .unwrap();

        assert_eq!(config.account, "someone");
        assert_eq!(config.webhook_url, "https://hook");
        assert_eq!(config.marker_path, PathBuf::from(DEFAULT_MARKER_PATH));
        assert_eq!(config.send_delay, Duration::from_millis(400));
        assert_eq!(config.navigation_timeout, Duration::from_secs(45));
        assert_eq!(config.failure_policy, FailurePolicy::Halt);
        assert_eq!(config.profile_url(), "https://mobile.twitter.com/someone");
    }

    #[test]
    fn test_optional_overrides() {
        let config = RelayConfig::from_lookup(lookup(&[
            (ENV_ACCOUNT, "someone"),
            (ENV_WEBHOOK_URL, "https://hook"),
            (ENV_MARKER_PATH, "/data/marker"),
            (ENV_BASE_URL, "https://x.com/"),
            (ENV_SEND_DELAY_MS, "50"),
            (ENV_NAVIGATION_TIMEOUT_SECS, "10"),
            (ENV_FAILURE_POLICY, "Skip"),
        ]))
        .unwrap();

        assert_eq!(config.marker_path, PathBuf::from("/data/marker"));
        assert_eq!(config.profile_url(), "https://x.com/someone");
        assert_eq!(config.send_delay, Duration::from_millis(50));
        assert_eq!(config.navigation_timeout, Duration::from_secs(10));
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
    }

    #[test]
    fn test_bad_optional_values_fall_back() {
        let config = RelayConfig::from_lookup(lookup(&[
            (ENV_ACCOUNT, "someone"),
            (ENV_WEBHOOK_URL, "https://hook"),
            (ENV_SEND_DELAY_MS, "soon"),
            (ENV_FAILURE_POLICY, "retry"),
        ]))
        .unwrap();

        assert_eq!(config.send_delay, DEFAULT_SEND_DELAY);
        assert_eq!(config.failure_policy, FailurePolicy::Halt);
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!(FailurePolicy::parse("halt"), Some(FailurePolicy::Halt));
        assert_eq!(FailurePolicy::parse(" SKIP "), Some(FailurePolicy::Skip));
        assert_eq!(FailurePolicy::parse("maybe"), None);
    }
}
