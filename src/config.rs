use crate::feeds::newsapi::NEWSAPI_BASE;
use crate::topics::DEFAULT_TOPICS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "vibe-news";
pub const API_KEY_ENV: &str = "NEWSAPI_KEY";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub page_size: usize,
    pub default_topics: Vec<String>,
    pub rate_limit_cooldown_secs: u64,
    pub request_timeout_secs: u64,
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: NEWSAPI_BASE.to_string(),
            page_size: 5,
            default_topics: DEFAULT_TOPICS.iter().map(|s| s.to_string()).collect(),
            rate_limit_cooldown_secs: 60,
            request_timeout_secs: 15,
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join("config.toml"))
    }

    /// Reads `path`, or returns defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Writes the default config to `path`, refusing to clobber an existing file.
    pub fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("config already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(&Self::default())?)?;
        Ok(())
    }

    /// The environment variable wins over the file.
    pub fn api_key(&self, from_env: Option<String>) -> Option<String> {
        from_env
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
        })
    }

    /// Only 5 and 10 are offered; anything else falls back to 5.
    pub fn page_size(&self) -> usize {
        match self.page_size {
            5 | 10 => self.page_size,
            _ => 5,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_topics, ["Trump", "Steelers", "AI"]);
        assert_eq!(config.cooldown(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            page_size = 10
            default_topics = ["Rust"]
            "#,
        )
        .unwrap();
        assert_eq!(config.page_size(), 10);
        assert_eq!(config.default_topics, ["Rust"]);
        assert_eq!(config.base_url, NEWSAPI_BASE);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "page_size = \"lots\"").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_unsupported_page_size_falls_back_to_five() {
        for (requested, effective) in [(5, 5), (10, 10), (0, 5), (7, 5), (500, 5)] {
            let config = Config {
                page_size: requested,
                ..Config::default()
            };
            assert_eq!(config.page_size(), effective, "page_size = {}", requested);
        }
    }

    #[test]
    fn test_env_api_key_overrides_file() {
        let config = Config {
            api_key: Some("from-file".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_key(Some("from-env".to_string())).as_deref(), Some("from-env"));
        assert_eq!(config.api_key(Some("  ".to_string())).as_deref(), Some("from-file"));
        assert_eq!(config.api_key(None).as_deref(), Some("from-file"));
    }

    #[test]
    fn test_write_default_round_trips_and_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::write_default(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        assert!(Config::write_default(&path).is_err());
    }
}
