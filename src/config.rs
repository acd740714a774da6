use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use tft_advisor::LlmConfig;
use tft_data::fetch::FetchConfig;

/// Application configuration. Every field has a default so an empty (or
/// absent) config.json is valid; secrets come from the environment only.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub capture: CaptureSettings,
    pub fetch: FetchSettings,
    pub llm: LlmSettings,
    pub speech: SpeechSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub interval_ms: u64,
    /// Substring of the window title to capture, overriding auto-detection
    pub window_title: Option<String>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            window_title: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub champions_url: Option<String>,
    pub comps_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            champions_url: None,
            comps_url: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Prefer the GEMINI_API_KEY environment variable over this field
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            base_url: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub enabled: bool,
    /// Voice name passed to the TTS program, when it supports one
    pub voice: Option<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            voice: None,
        }
    }
}

impl AppConfig {
    /// Load configuration: explicit path, else ./config.json, else the
    /// user config dir, else defaults. Environment variables win last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::find_config_file(explicit) {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let config: Self = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            None => {
                info!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                config.llm.api_key = Some(key);
            }
        }
        if let Ok(dir) = std::env::var("DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        Ok(config)
    }

    fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let local = PathBuf::from("config.json");
        if local.exists() {
            return Some(local);
        }
        let user = dirs::config_dir()?.join("tft-copilot").join("config.json");
        user.exists().then_some(user)
    }

    /// Where the data files live. Defaults to ./data, falling back to the
    /// user cache dir when the working directory is not writable territory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        let local = PathBuf::from("data");
        if local.exists() {
            return local;
        }
        dirs::cache_dir()
            .map(|p| p.join("tft-copilot"))
            .unwrap_or(local)
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture.interval_ms)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let mut cfg = FetchConfig {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            max_retries: self.fetch.max_retries,
            ..Default::default()
        };
        if let Some(url) = &self.fetch.champions_url {
            cfg.champions_url = url.clone();
        }
        if let Some(url) = &self.fetch.comps_url {
            cfg.comps_url = url.clone();
        }
        cfg
    }

    /// LLM client config, or None when no API key is available.
    pub fn llm_config(&self) -> Option<LlmConfig> {
        let api_key = self.llm.api_key.clone()?;
        if api_key.is_empty() {
            return None;
        }
        let mut cfg = LlmConfig {
            api_key,
            model: self.llm.model.clone(),
            timeout: Duration::from_secs(self.llm.timeout_secs),
            max_retries: self.llm.max_retries,
            ..Default::default()
        };
        if let Some(url) = &self.llm.base_url {
            cfg.base_url = url.clone();
        }
        Some(cfg)
    }

    /// Build the LLM client, logging instead of failing when unconfigured.
    pub fn llm_client(&self) -> Option<tft_advisor::LlmClient> {
        let cfg = self.llm_config()?;
        match tft_advisor::LlmClient::new(cfg) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("LLM client unavailable: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.capture.interval_ms, 500);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert!(config.speech.enabled);
    }

    #[test]
    fn test_partial_override() {
        let config: AppConfig = serde_json::from_str(
            r#"{"capture": {"interval_ms": 250}, "speech": {"enabled": false}}"#,
        )
        .unwrap();
        assert_eq!(config.capture.interval_ms, 250);
        assert!(!config.speech.enabled);
        assert_eq!(config.llm.max_retries, 3);
    }

    #[test]
    fn test_llm_config_requires_key() {
        let config = AppConfig::default();
        assert!(config.llm_config().is_none());

        let config: AppConfig =
            serde_json::from_str(r#"{"llm": {"api_key": "k", "model": "m"}}"#).unwrap();
        let llm = config.llm_config().unwrap();
        assert_eq!(llm.model, "m");
    }
}
