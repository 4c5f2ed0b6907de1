//! Harness configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{E2eError, E2eResult};
use crate::wait::WaitPolicy;

/// Harness configuration, read from `wizcheck.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Origin the wizard's entry path is joined to
    pub base_url: String,

    /// Scenarios run at the same time, each in its own session
    pub concurrency: usize,

    /// Where `test-results.json` is written
    pub output_dir: PathBuf,

    pub timeouts: TimeoutConfig,

    pub browser: BrowserSettings,

    /// Role or slot-kind name -> CSS selector, overriding the built-in GOV.UK selectors
    pub selectors: BTreeMap<String, String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.gov.uk".to_string(),
            concurrency: 1,
            output_dir: PathBuf::from("test-results"),
            timeouts: TimeoutConfig::default(),
            browser: BrowserSettings::default(),
            selectors: BTreeMap::new(),
        }
    }
}

/// Per-suspension-point timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for any single wait or accessor call
    pub step_timeout_ms: u64,

    /// Delay between polls while waiting for an expectation
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: 5000,
            poll_interval_ms: 100,
        }
    }
}

/// Chromium launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,

    /// Chrome binary; auto-detected when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_executable: Option<PathBuf>,

    pub viewport_width: u32,

    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file; a missing file yields the defaults
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::InvalidConfig(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.concurrency == 0 {
            return Err(E2eError::InvalidConfig("concurrency must be at least 1".to_string()));
        }
        if self.timeouts.poll_interval_ms > self.timeouts.step_timeout_ms {
            return Err(E2eError::InvalidConfig(
                "poll_interval_ms must not exceed step_timeout_ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout_ms: self.timeouts.step_timeout_ms,
            poll_interval_ms: self.timeouts.poll_interval_ms,
        }
    }

    /// `base_url` joined with a wizard's entry path
    pub fn entry_url(&self, entry_path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            entry_path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.wait_policy(), WaitPolicy::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wizcheck.toml");
        let mut config = HarnessConfig::default();
        config.concurrency = 4;
        config
            .selectors
            .insert("error_hint".to_string(), ".govuk-error-message".to_string());
        config.save(&path).unwrap();

        let loaded = HarnessConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wizcheck.toml");
        std::fs::write(&path, "base_url = \"http://localhost:3000\"\n\n[timeouts]\nstep_timeout_ms = 200\n")
            .unwrap();
        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeouts.step_timeout_ms, 200);
        assert_eq!(config.timeouts.poll_interval_ms, 100);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wizcheck.toml");
        std::fs::write(&path, "concurrency = 0\n").unwrap();
        assert!(matches!(
            HarnessConfig::load(&path),
            Err(E2eError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_entry_url_joins_without_double_slash() {
        let mut config = HarnessConfig::default();
        config.base_url = "https://www.gov.uk/".to_string();
        assert_eq!(
            config.entry_url("/calculate-your-holiday-entitlement"),
            "https://www.gov.uk/calculate-your-holiday-entitlement"
        );
    }
}
