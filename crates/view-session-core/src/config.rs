//! Heartbeat and deferred-polling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of the environment variables read by [`SessionConfig::from_env`].
pub const ENV_PREFIX: &str = "VIEW_SESSION_";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Timing and threshold settings for a session client.
///
/// Durations serialize as whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between heartbeats while the session is healthy.
    #[serde(rename = "normal_interval_ms", with = "millis")]
    pub normal_interval: Duration,

    /// Delay before retrying a failed heartbeat.
    #[serde(rename = "retry_interval_ms", with = "millis")]
    pub retry_interval: Duration,

    /// Consecutive heartbeat failures tolerated before contact is lost.
    pub max_failures: u32,

    /// Delay before the first poll of a deferred job.
    #[serde(rename = "deferred_fast_poll_ms", with = "millis")]
    pub deferred_fast_poll: Duration,

    /// Delay between polls while the job is still deferred.
    #[serde(rename = "deferred_poll_ms", with = "millis")]
    pub deferred_poll: Duration,

    /// Delay before re-polling after a transport failure.
    #[serde(rename = "deferred_error_poll_ms", with = "millis")]
    pub deferred_error_poll: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            normal_interval: Duration::from_millis(10_000),
            retry_interval: Duration::from_millis(1_000),
            max_failures: 5,
            deferred_fast_poll: Duration::from_millis(200),
            deferred_poll: Duration::from_millis(1_000),
            deferred_error_poll: Duration::from_millis(5_000),
        }
    }
}

impl SessionConfig {
    /// Override the healthy heartbeat interval.
    #[must_use]
    pub const fn with_normal_interval(mut self, interval: Duration) -> Self {
        self.normal_interval = interval;
        self
    }

    /// Override the heartbeat retry interval.
    #[must_use]
    pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Override the failure threshold.
    #[must_use]
    pub const fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Override the three deferred-polling delays.
    #[must_use]
    pub const fn with_deferred_polls(
        mut self,
        fast: Duration,
        deferred: Duration,
        error: Duration,
    ) -> Self {
        self.deferred_fast_poll = fast;
        self.deferred_poll = deferred;
        self.deferred_error_poll = error;
        self
    }

    /// Defaults overridden by `VIEW_SESSION_*` environment variables.
    ///
    /// # Errors
    /// Returns error if a variable is set but is not a whole number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `VIEW_SESSION_*` key.
    ///
    /// # Errors
    /// Returns error if a value is present but is not a whole number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let read = |name: &str| -> Result<Option<u64>, ConfigError> {
            let key = format!("{ENV_PREFIX}{name}");
            match lookup(&key) {
                None => Ok(None),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| ConfigError::InvalidValue { key, value }),
            }
        };

        if let Some(ms) = read("NORMAL_INTERVAL_MS")? {
            config.normal_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = read("RETRY_INTERVAL_MS")? {
            config.retry_interval = Duration::from_millis(ms);
        }
        if let Some(n) = read("MAX_FAILURES")? {
            config.max_failures = u32::try_from(n).unwrap_or(u32::MAX);
        }
        if let Some(ms) = read("DEFERRED_FAST_POLL_MS")? {
            config.deferred_fast_poll = Duration::from_millis(ms);
        }
        if let Some(ms) = read("DEFERRED_POLL_MS")? {
            config.deferred_poll = Duration::from_millis(ms);
        }
        if let Some(ms) = read("DEFERRED_ERROR_POLL_MS")? {
            config.deferred_error_poll = Duration::from_millis(ms);
        }

        tracing::debug!(?config, "Loaded session config");
        Ok(config)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.normal_interval, Duration::from_secs(10));
        assert_eq!(config.retry_interval, Duration::from_secs(1));
        assert_eq!(config.max_failures, 5);
        assert_eq!(config.deferred_fast_poll, Duration::from_millis(200));
        assert_eq!(config.deferred_poll, Duration::from_secs(1));
        assert_eq!(config.deferred_error_poll, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VIEW_SESSION_NORMAL_INTERVAL_MS", "2500"),
            ("VIEW_SESSION_MAX_FAILURES", " 3 "),
        ]
        .into_iter()
        .collect();

        let config =
            assert_ok!(SessionConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)));
        assert_eq!(config.normal_interval, Duration::from_millis(2500));
        assert_eq!(config.max_failures, 3);
        assert_eq!(config.retry_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = assert_err!(SessionConfig::from_lookup(|key| {
            (key == "VIEW_SESSION_DEFERRED_POLL_MS").then(|| "soon".to_string())
        }));
        assert!(err.to_string().contains("VIEW_SESSION_DEFERRED_POLL_MS"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "retry_interval_ms": 250, "max_failures": 2 }"#).unwrap();
        assert_eq!(config.retry_interval, Duration::from_millis(250));
        assert_eq!(config.max_failures, 2);
        assert_eq!(config.normal_interval, Duration::from_secs(10));

        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["deferred_fast_poll_ms"], 200);
    }
}
