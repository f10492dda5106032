//! Runner, HTTP client and browser configuration
//!
//! Loaded from `sitecheck.toml` when present. Every field has a default so
//! a partial file only overrides what it names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};
use crate::playwright::Browser;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "sitecheck.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteCheckConfig {
    /// Directory the JSON report is written to
    pub output_dir: Option<PathBuf>,

    pub runner: RunnerConfig,
    pub http: HttpConfig,
    pub browser: BrowserConfig,
}

/// Check runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Checks in flight at once
    pub concurrency: usize,

    /// Timeout for checks without `max_response_time_ms`
    pub default_timeout_ms: u64,

    /// Added to `max_response_time_ms` to get the transport timeout, so a
    /// slightly slow response still reports as a latency failure
    pub timeout_grace_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            default_timeout_ms: 30_000,
            timeout_grace_ms: 1_000,
        }
    }
}

impl RunnerConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn timeout_grace(&self) -> Duration {
        Duration::from_millis(self.timeout_grace_ms)
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    /// Redirects followed when a check allows following
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("sitecheck/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_ms: 10_000,
            max_redirects: 10,
        }
    }
}

/// Browser (Playwright) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Node executable used to run generated Playwright scripts
    pub node_binary: PathBuf,
    /// Directory whose node_modules provides `playwright`
    pub working_dir: Option<PathBuf>,
    /// Budget for starting node and launching the browser, on top of the
    /// check timeout
    pub launch_timeout_ms: u64,
}

impl BrowserConfig {
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_millis(self.launch_timeout_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            working_dir: None,
            launch_timeout_ms: 30_000,
        }
    }
}

impl SiteCheckConfig {
    /// Load configuration from file, falling back to defaults when the file
    /// does not exist
    pub fn load(path: &Path) -> RunnerResult<Self> {
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
    pub fn save(&self, path: &Path) -> RunnerResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RunnerError::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if self.runner.concurrency == 0 {
            return Err(RunnerError::InvalidConfig(
                "runner.concurrency must be at least 1".to_string(),
            ));
        }
        if self.runner.default_timeout_ms == 0 {
            return Err(RunnerError::InvalidConfig(
                "runner.default_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteCheckConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.runner.concurrency, 4);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
[runner]
concurrency = 8

[browser]
browser = "firefox"
"#,
        )
        .unwrap();

        let config = SiteCheckConfig::load(&path).unwrap();
        assert_eq!(config.runner.concurrency, 8);
        assert_eq!(config.runner.default_timeout_ms, 30_000);
        assert_eq!(config.browser.browser, Browser::Firefox);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[runner]\nconcurrency = 0\n").unwrap();
        assert!(matches!(
            SiteCheckConfig::load(&path),
            Err(RunnerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut config = SiteCheckConfig::default();
        config.http.max_redirects = 0;
        config.save(&path).unwrap();

        let loaded = SiteCheckConfig::load(&path).unwrap();
        assert_eq!(loaded.http.max_redirects, 0);
    }
}
