//! Process-wide hook processing configuration.
//!
//! Built once at startup and handed to each processor at construction; the
//! processors never consult the environment themselves.

use std::env;
use std::time::Duration;

use crate::ConfigError;

/// Overrides [`HookConfig::scan_on_empty_changes`].
pub const SCAN_ON_EMPTY_CHANGES_ENV: &str = "BITBUCKET_SCAN_ON_EMPTY_CHANGES";

/// Overrides [`HookConfig::event_delay`], in whole seconds.
pub const EVENT_DELAY_SECONDS_ENV: &str = "BITBUCKET_EVENT_DELAY_SECONDS";

const DEFAULT_EVENT_DELAY_SECONDS: u64 = 5;

/// Tuning knobs for push hook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// When a push arrives without any change, re-index the whole repository
    /// (`true`) or skip it with a log line (`false`).
    pub scan_on_empty_changes: bool,
    /// Coalescing window applied before emitted events trigger a scan.
    pub event_delay: Duration,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            scan_on_empty_changes: true,
            event_delay: Duration::from_secs(DEFAULT_EVENT_DELAY_SECONDS),
        }
    }
}

impl HookConfig {
    /// Loads the defaults, overridden by [`SCAN_ON_EMPTY_CHANGES_ENV`] and
    /// [`EVENT_DELAY_SECONDS_ENV`] when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`HookConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(SCAN_ON_EMPTY_CHANGES_ENV) {
            config.scan_on_empty_changes = parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                name: SCAN_ON_EMPTY_CHANGES_ENV,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(EVENT_DELAY_SECONDS_ENV) {
            let seconds: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: EVENT_DELAY_SECONDS_ENV,
                value: raw.clone(),
            })?;
            config.event_delay = Duration::from_secs(seconds);
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_scan_on_empty_changes_with_five_second_delay() {
        let config = HookConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HookConfig::default());
        assert!(config.scan_on_empty_changes);
        assert_eq!(config.event_delay, Duration::from_secs(5));
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = HookConfig::from_lookup(lookup(&[
            (SCAN_ON_EMPTY_CHANGES_ENV, "false"),
            (EVENT_DELAY_SECONDS_ENV, "0"),
        ]))
        .unwrap();
        assert!(!config.scan_on_empty_changes);
        assert_eq!(config.event_delay, Duration::ZERO);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = HookConfig::from_lookup(lookup(&[(SCAN_ON_EMPTY_CHANGES_ENV, "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains(SCAN_ON_EMPTY_CHANGES_ENV));
        assert!(HookConfig::from_lookup(lookup(&[(EVENT_DELAY_SECONDS_ENV, "-1")])).is_err());
    }
}
