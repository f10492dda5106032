//! Playwright-backed fetcher
//!
//! Each fetch generates a small Node script that drives Playwright and
//! prints one JSON observation on stdout. UI checks navigate a real
//! browser page; HTTP checks go through Playwright's request API, which
//! mirrors what a browser-side test would see.

use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::config::BrowserConfig;
use crate::error::{RunnerError, RunnerResult, TransportError};
use crate::fetcher::{FetchOptions, Fetcher, HttpResponse, PageResponse};
use crate::spec::CheckMode;

/// Redirect limit handed to Playwright when a check follows redirects
const MAX_REDIRECTS: u32 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(RunnerError::InvalidConfig(format!("unknown browser: {}", other))),
        }
    }
}

/// Error payload printed by a failing script
#[derive(Debug, Deserialize)]
struct ScriptError {
    error: String,
}

/// Fetcher that shells out to Node + Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightFetcher {
    node_binary: PathBuf,
    working_dir: Option<PathBuf>,
    browser: Browser,
    headless: bool,
    viewport_width: u32,
    viewport_height: u32,
    launch_timeout: Duration,
}

impl PlaywrightFetcher {
    /// Create a fetcher, verifying that Playwright is installed
    pub async fn new(config: BrowserConfig) -> RunnerResult<Self> {
        let fetcher = Self::without_probe(config);
        fetcher.check_playwright_installed().await?;
        Ok(fetcher)
    }

    /// Create a fetcher without checking the installation
    pub fn without_probe(config: BrowserConfig) -> Self {
        Self {
            launch_timeout: config.launch_timeout(),
            node_binary: config.node_binary,
            working_dir: config.working_dir,
            browser: config.browser,
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
        }
    }

    async fn check_playwright_installed(&self) -> RunnerResult<()> {
        let mut cmd = Command::new(&self.node_binary);
        cmd.args(["-e", "require('playwright')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        match cmd.status().await {
            Ok(status) if status.success() => Ok(()),
            _ => Err(RunnerError::PlaywrightNotFound),
        }
    }

    /// Script that navigates a page and reports status, text, title and
    /// selector visibility
    pub fn build_page_script(&self, url: &str, options: &FetchOptions) -> String {
        format!(
            r#"
const {{ {browser} }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless}, timeout: {launch_timeout} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const url = {url};
  const selectors = {selectors};

  try {{
    const started = Date.now();
    const response = await page.goto(url, {{ timeout: {timeout}, waitUntil: 'load' }});
    const latencyMs = Date.now() - started;

    const visibility = {{}};
    for (const selector of selectors) {{
      visibility[selector] = await page.locator(selector).first().isVisible().catch(() => false);
    }}

    console.log(JSON.stringify({{
      status: response ? response.status() : 0,
      headers: response ? response.headers() : {{}},
      body_text: await page.innerText('body').catch(() => ''),
      title: await page.title(),
      visibility,
      latency_ms: latencyMs,
    }}));
  }} catch (error) {{
    console.log(JSON.stringify({{ error: error.message }}));
    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})();
"#,
            browser = self.browser.as_str(),
            headless = self.headless,
            launch_timeout = self.launch_timeout.as_millis(),
            width = self.viewport_width,
            height = self.viewport_height,
            url = js_string(url),
            selectors = js_array(&options.probe_selectors),
            timeout = options.timeout.as_millis(),
        )
    }

    /// Script that issues a GET through Playwright's request API
    pub fn build_request_script(&self, url: &str, options: &FetchOptions) -> String {
        let max_redirects = if options.follow_redirects { MAX_REDIRECTS } else { 0 };
        format!(
            r#"
const {{ request }} = require('playwright');

(async () => {{
  const context = await request.newContext();
  const url = {url};

  try {{
    const started = Date.now();
    const response = await context.get(url, {{ timeout: {timeout}, maxRedirects: {max_redirects} }});
    const body = await response.text();
    const latencyMs = Date.now() - started;

    console.log(JSON.stringify({{
      status: response.status(),
      headers: response.headers(),
      body_text: body,
      latency_ms: latencyMs,
    }}));
  }} catch (error) {{
    console.log(JSON.stringify({{ error: error.message }}));
    process.exitCode = 1;
  }} finally {{
    await context.dispose();
  }}
}})();
"#,
            url = js_string(url),
            timeout = options.timeout.as_millis(),
            max_redirects = max_redirects,
        )
    }

    /// Wall-clock limit for the node process: the check timeout plus the
    /// launch budget
    pub fn process_timeout(&self, options: &FetchOptions) -> Duration {
        options.timeout + self.launch_timeout
    }

    /// Run a script with node and parse its observation
    async fn run_script(
        &self,
        script: &str,
        options: &FetchOptions,
    ) -> Result<PageResponse, TransportError> {
        debug!("Running Playwright script ({} bytes)", script.len());

        let mut cmd = Command::new(&self.node_binary);
        cmd.arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(self.process_timeout(options), cmd.output())
            .await
            .map_err(|_| TransportError::Timeout(options.timeout))?
            .map_err(|e| TransportError::Navigation(format!("failed to run node: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let reason = parse_script_error(&stdout)
                .unwrap_or_else(|| String::from_utf8_lossy(&output.stderr).trim().to_string());
            return Err(TransportError::Navigation(reason));
        }

        parse_observation(&stdout)
    }
}

#[async_trait]
impl Fetcher for PlaywrightFetcher {
    fn supports(&self, _mode: CheckMode) -> bool {
        true
    }

    fn startup_allowance(&self, _mode: CheckMode) -> Duration {
        self.launch_timeout
    }

    async fn fetch_http(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<HttpResponse, TransportError> {
        let script = self.build_request_script(url, options);
        let observed = self.run_script(&script, options).await?;
        Ok(HttpResponse {
            status: observed.status,
            headers: observed.headers,
            body: Bytes::from(observed.body_text),
            latency_ms: observed.latency_ms,
        })
    }

    async fn navigate(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<PageResponse, TransportError> {
        let script = self.build_page_script(url, options);
        self.run_script(&script, options).await
    }
}

/// Quote a value as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn js_array(values: &[String]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}

/// The last stdout line that parses as an observation
fn parse_observation(stdout: &str) -> Result<PageResponse, TransportError> {
    stdout
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str::<PageResponse>(line.trim()).ok())
        .ok_or_else(|| {
            TransportError::Navigation(format!(
                "no observation in Playwright output: {}",
                stdout.trim()
            ))
        })
}

fn parse_script_error(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str::<ScriptError>(line.trim()).ok())
        .map(|e| e.error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> PlaywrightFetcher {
        PlaywrightFetcher::without_probe(BrowserConfig::default())
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("Firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert_eq!("chrome".parse::<Browser>().unwrap(), Browser::Chromium);
        assert!("lynx".parse::<Browser>().is_err());
    }

    #[test]
    fn test_page_script_quotes_inputs() {
        let options = FetchOptions {
            timeout: Duration::from_millis(4_000),
            follow_redirects: true,
            probe_selectors: vec![r#"footer a[href*="github.com"]"#.to_string()],
        };
        let script = fetcher().build_page_script("https://example.test/it's", &options);

        assert!(script.contains(r#"const url = "https://example.test/it's";"#));
        assert!(script.contains(r#"["footer a[href*=\"github.com\"]"]"#));
        assert!(script.contains("timeout: 4000"));
        assert!(script.contains("chromium.launch({ headless: true, timeout: 30000 })"));
        assert!(script.contains("width: 1280, height: 720"));
    }

    #[test]
    fn test_launch_budget_sits_outside_navigation_timeout() {
        let fetcher = PlaywrightFetcher::without_probe(BrowserConfig {
            launch_timeout_ms: 15_000,
            ..Default::default()
        });
        let options = FetchOptions {
            timeout: Duration::from_millis(2_000),
            ..Default::default()
        };

        let script = fetcher.build_page_script("https://example.test/", &options);
        assert!(script.contains("page.goto(url, { timeout: 2000,"));
        assert!(script.contains("launch({ headless: true, timeout: 15000 })"));
        assert_eq!(fetcher.process_timeout(&options), Duration::from_millis(17_000));
        assert_eq!(
            fetcher.startup_allowance(CheckMode::Ui),
            Duration::from_millis(15_000)
        );
    }

    #[test]
    fn test_script_failure_still_closes_browser() {
        let options = FetchOptions::default();
        let script = fetcher().build_page_script("https://example.test/", &options);
        assert!(!script.contains("process.exit("));
        assert!(script.contains("process.exitCode = 1;"));
        assert!(script.contains("finally {\n    await browser.close();"));
    }

    #[test]
    fn test_request_script_redirect_policy() {
        let mut options = FetchOptions::default();
        let script = fetcher().build_request_script("https://example.test/docs/", &options);
        assert!(script.contains("maxRedirects: 20"));

        options.follow_redirects = false;
        let script = fetcher().build_request_script("https://example.test/docs/", &options);
        assert!(script.contains("maxRedirects: 0"));
    }

    #[test]
    fn test_parse_observation_uses_last_json_line() {
        let stdout = r#"warming up
{"status":200,"headers":{"content-type":"text/html"},"body_text":"Example Domain","title":"Example","visibility":{"footer":true},"latency_ms":42}
"#;
        let page = parse_observation(stdout).unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.title.as_deref(), Some("Example"));
        assert_eq!(page.visibility["footer"], true);
        assert_eq!(page.latency_ms, 42);
    }

    #[test]
    fn test_parse_observation_without_json() {
        assert!(matches!(
            parse_observation("nothing here"),
            Err(TransportError::Navigation(_))
        ));
    }

    #[test]
    fn test_parse_script_error() {
        let stdout = r#"{"error":"net::ERR_NAME_NOT_RESOLVED at https://nope.test/"}"#;
        assert_eq!(
            parse_script_error(stdout).as_deref(),
            Some("net::ERR_NAME_NOT_RESOLVED at https://nope.test/")
        );
    }
}
