//! Run Command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sitecheck::http::HttpFetcher;
use sitecheck::playwright::{Browser, PlaywrightFetcher};
use sitecheck::{CheckMode, CheckRunner, CheckSpec, CompositeFetcher, Fetcher, SiteCheckConfig};

use crate::commands::Selection;
use crate::output::{self, OutputFormat};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Checks in flight at once
    #[arg(short, long, env = "SITECHECK_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Timeout for checks without a latency bound (ms)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Browser to use for UI checks (chromium, firefox, webkit)
    #[arg(long)]
    pub browser: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Skip UI checks instead of launching a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Send HTTP checks through Playwright's request API as well
    #[arg(long, conflicts_with = "no_browser")]
    pub playwright_http: bool,

    /// Directory to write sitecheck-report.json into
    #[arg(short, long, env = "SITECHECK_OUTPUT")]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Fold command-line overrides into the file configuration
    pub fn apply(&self, mut config: SiteCheckConfig) -> Result<SiteCheckConfig> {
        if let Some(concurrency) = self.concurrency {
            config.runner.concurrency = concurrency;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.runner.default_timeout_ms = timeout_ms;
        }
        if let Some(browser) = &self.browser {
            config.browser.browser = browser.parse::<Browser>()?;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Run the selected checks. Returns whether every check passed.
pub async fn execute(args: RunArgs, config: SiteCheckConfig, format: OutputFormat) -> Result<bool> {
    let config = args.apply(config)?;

    let mut checks = args.selection.load()?;
    if args.no_browser {
        let before = checks.len();
        checks.retain(|c| c.mode == CheckMode::Http);
        if checks.len() < before {
            output::print_warning(&format!(
                "Skipping {} UI check(s) (--no-browser)",
                before - checks.len()
            ));
        }
    }

    let fetcher = build_fetcher(&checks, &config, args.playwright_http).await?;

    let runner = CheckRunner::with_config(config.runner.clone());
    let cancel = runner.cancellation_token();
    spawn_interrupt_handler(cancel.clone());

    let report = runner.run(&checks, &fetcher).await?;
    cancel.cancel();

    output::print_report(&report, format);

    if let Some(dir) = &config.output_dir {
        report.write_json(dir)?;
    }

    Ok(report.passed())
}

/// HTTP goes to reqwest unless Playwright is requested; a browser is only
/// launched when some check needs one
async fn build_fetcher(
    checks: &[CheckSpec],
    config: &SiteCheckConfig,
    playwright_http: bool,
) -> Result<CompositeFetcher> {
    let needs_browser = checks.iter().any(|c| c.mode == CheckMode::Ui);

    let playwright: Option<Arc<dyn Fetcher>> = if needs_browser || playwright_http {
        let fetcher = PlaywrightFetcher::new(config.browser.clone()).await?;
        Some(Arc::new(fetcher) as Arc<dyn Fetcher>)
    } else {
        None
    };

    let http: Arc<dyn Fetcher> = match (&playwright, playwright_http) {
        (Some(playwright), true) => playwright.clone(),
        _ => Arc::new(HttpFetcher::new(&config.http)?) as Arc<dyn Fetcher>,
    };

    let mut fetcher = CompositeFetcher::new().with_http(http);
    if let Some(playwright) = playwright {
        fetcher = fetcher.with_ui(playwright);
    }
    Ok(fetcher)
}

/// First Ctrl-C stops new checks; in-flight checks finish or time out
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        info!("Interrupted, waiting for in-flight checks...");
                        cancel.cancel();
                    }
                    Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunArgs,
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let harness = Harness::parse_from([
            "sitecheck",
            "suites/",
            "--concurrency",
            "8",
            "--browser",
            "webkit",
            "--headed",
            "--output",
            "out",
        ]);

        let config = harness.run.apply(SiteCheckConfig::default()).unwrap();
        assert_eq!(config.runner.concurrency, 8);
        assert_eq!(config.browser.browser, Browser::Webkit);
        assert!(!config.browser.headless);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let harness = Harness::parse_from(["sitecheck", "suites/", "--concurrency", "0"]);
        assert!(harness.run.apply(SiteCheckConfig::default()).is_err());

        let harness = Harness::parse_from(["sitecheck", "suites/", "--browser", "lynx"]);
        assert!(harness.run.apply(SiteCheckConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_http_only_checks_do_not_need_a_browser() {
        let checks = vec![CheckSpec::http("https://example.test/")
            .status([200])
            .body_contains("Example")];

        let fetcher = build_fetcher(&checks, &SiteCheckConfig::default(), false)
            .await
            .unwrap();
        assert!(fetcher.supports(CheckMode::Http));
        assert!(!fetcher.supports(CheckMode::Ui));
    }
}
