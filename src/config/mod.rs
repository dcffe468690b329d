use std::path::PathBuf;
use std::time::Duration;
use crate::error::{HashWatchError, Result};
use crate::lookup::MALWARE_BAZAAR_URL;

pub const DEFAULT_STATE_PATH: &str = "./fim_data.json";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: MALWARE_BAZAAR_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
        }
    }
}

impl LookupConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub state_path: PathBuf,
    pub poll_interval: Duration,
    /// Abort startup instead of continuing with an empty registry.
    pub strict_load: bool,
    pub lookup: LookupConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            strict_load: false,
            lookup: LookupConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_strict_load(mut self, strict: bool) -> Self {
        self.strict_load = strict;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupConfig) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(HashWatchError::Config("poll interval must be greater than zero".into()));
        }
        if self.lookup.enabled {
            if self.lookup.endpoint.trim().is_empty() {
                return Err(HashWatchError::Config("lookup endpoint is empty".into()));
            }
            if self.lookup.timeout.is_zero() {
                return Err(HashWatchError::Config("lookup timeout must be greater than zero".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.state_path, PathBuf::from("./fim_data.json"));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(!config.strict_load);
        assert!(config.lookup.enabled);
        assert_eq!(config.lookup.endpoint, MALWARE_BAZAAR_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = MonitorConfig::default().with_poll_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(HashWatchError::Config(_))));
    }

    #[test]
    fn test_blank_api_key_dropped() {
        let lookup = LookupConfig::default().with_api_key(Some("  ".into()));
        assert!(lookup.api_key.is_none());
    }

    #[test]
    fn test_disabled_lookup_skips_endpoint_check() {
        let config = MonitorConfig::default().with_lookup(LookupConfig::disabled().with_endpoint(""));
        assert!(config.validate().is_ok());
    }
}
