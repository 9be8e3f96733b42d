use formsync_autosave::AutoSaveConfig;
use formsync_editor::HistoryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "formsync.config.json";

/// FormSync configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding saved forms
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory holding local fallback copies
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,

    #[serde(default)]
    pub autosave: AutoSaveConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_data_dir() -> String {
    "forms".to_string()
}

fn default_fallback_dir() -> String {
    ".formsync/fallback".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.autosave.validate()?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn data_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.data_dir)
    }

    pub fn fallback_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.fallback_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fallback_dir: default_fallback_dir(),
            autosave: AutoSaveConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "dataDir": "store",
            "fallbackDir": "tmp/fallback",
            "autosave": { "debounceMs": 250, "maxRetries": 5, "intervalMs": 30000 },
            "history": { "capacity": 20 }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, "store");
        assert_eq!(config.fallback_dir, "tmp/fallback");
        assert_eq!(config.autosave.debounce_ms, 250);
        assert_eq!(config.autosave.max_retries, 5);
        assert_eq!(config.autosave.retry_multiplier, 1.5);
        assert_eq!(config.autosave.interval_ms, Some(30000));
        assert_eq!(config.history.capacity, 20);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "dataDir": "db" }"#).unwrap();
        assert_eq!(config.data_dir, "db");
        assert_eq!(config.fallback_dir, ".formsync/fallback");
        assert_eq!(config.autosave, AutoSaveConfig::default());
        assert_eq!(config.history.capacity, 100);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.data_dir(dir.path()), dir.path().join("forms"));
    }

    #[test]
    fn test_negative_multiplier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "autosave": { "debounceMs": 100, "retryMultiplier": -1.5 } }"#,
        )
        .unwrap();

        let err = Config::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("retryMultiplier"));
    }
}
