use crate::errors::AutoSaveError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Auto-save tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveConfig {
    /// Quiet period before a queued edit is saved
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff growth per retry
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,

    /// Optional periodic flush of pending changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,

    /// Keep a local copy of the document for recovery
    #[serde(default = "default_enable_fallback")]
    pub enable_fallback: bool,
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_multiplier() -> f64 {
    1.5
}

fn default_enable_fallback() -> bool {
    true
}

impl AutoSaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Reject values the engine cannot schedule with
    pub fn validate(&self) -> Result<(), AutoSaveError> {
        if !self.retry_multiplier.is_finite() || self.retry_multiplier < 0.0 {
            return Err(AutoSaveError::InvalidConfig(format!(
                "retryMultiplier must be a finite, non-negative number (got {})",
                self.retry_multiplier
            )));
        }
        Ok(())
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_multiplier(mut self, multiplier: f64) -> Self {
        self.retry_multiplier = multiplier;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_retries: default_max_retries(),
            retry_multiplier: default_retry_multiplier(),
            interval_ms: None,
            enable_fallback: default_enable_fallback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AutoSaveConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(1000));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_multiplier, 1.5);
        assert_eq!(config.interval(), None);
        assert!(config.enable_fallback);
    }

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{ "debounceMs": 250, "intervalMs": 30000 }"#;
        let config: AutoSaveConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        assert!(AutoSaveConfig::default().validate().is_ok());
        assert!(AutoSaveConfig::default().with_retry_multiplier(0.0).validate().is_ok());

        for multiplier in [-1.5, f64::NAN, f64::INFINITY] {
            let config = AutoSaveConfig::default().with_retry_multiplier(multiplier);
            assert!(matches!(config.validate(), Err(AutoSaveError::InvalidConfig(_))));
        }
    }
}
