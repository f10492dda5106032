//! Check runner: executes checks against a fetcher and builds a report

use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::assertion::{evaluate_all, Observation};
use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult, TransportError};
use crate::fetcher::{FetchOptions, Fetcher};
use crate::report::{CheckResult, Report};
use crate::spec::{CheckMode, CheckSpec};

/// Run `specs` with the default runner configuration
pub async fn run(specs: &[CheckSpec], fetcher: &dyn Fetcher) -> RunnerResult<Report> {
    CheckRunner::new().run(specs, fetcher).await
}

/// Executes checks with bounded parallelism.
///
/// A runner holds no fetcher and no per-run state, so one runner can drive
/// several runs at once, each with its own fetcher.
#[derive(Debug, Clone)]
pub struct CheckRunner {
    config: RunnerConfig,
    cancel: CancellationToken,
}

impl Default for CheckRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckRunner {
    /// Create a runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the runner from starting further checks
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Validate every spec and make sure the fetcher can serve each mode in
    /// use. Nothing is fetched when this fails.
    pub fn validate(&self, specs: &[CheckSpec], fetcher: &dyn Fetcher) -> RunnerResult<()> {
        for (index, spec) in specs.iter().enumerate() {
            spec.validate().map_err(|reason| RunnerError::InvalidSpec {
                index,
                name: spec.display_name().to_string(),
                reason,
            })?;
        }

        for mode in [CheckMode::Http, CheckMode::Ui] {
            if specs.iter().any(|s| s.mode == mode) && !fetcher.supports(mode) {
                return Err(RunnerError::UnsupportedMode(mode));
            }
        }

        Ok(())
    }

    /// Run a list of checks.
    ///
    /// Only configuration errors are returned. Transport and assertion
    /// failures end up in the report, which always has one result per spec
    /// in input order.
    pub async fn run(&self, specs: &[CheckSpec], fetcher: &dyn Fetcher) -> RunnerResult<Report> {
        self.validate(specs, fetcher)?;

        let started_at = Utc::now();
        let start = Instant::now();
        let concurrency = self.config.concurrency.max(1);

        info!("Running {} check(s), {} at a time...", specs.len(), concurrency);

        let mut slots: Vec<Option<CheckResult>> = vec![None; specs.len()];
        let mut completed = stream::iter(specs.iter().enumerate())
            .map(|(index, spec)| async move { (index, self.run_check(spec, fetcher).await) })
            .buffer_unordered(concurrency);

        while let Some((index, result)) = completed.next().await {
            if result.skipped {
                debug!("- {} (skipped)", result.name());
            } else if result.passed {
                info!("✓ {} ({} ms)", result.name(), result.duration_ms);
            } else {
                error!("✗ {} - {}", result.name(), result.failures.join("; "));
            }
            slots[index] = Some(result);
        }

        let results: Vec<CheckResult> = slots
            .into_iter()
            .zip(specs)
            .map(|(slot, spec)| slot.unwrap_or_else(|| CheckResult::skipped(spec)))
            .collect();

        let duration_ms = start.elapsed().as_millis() as u64;
        let report = Report::new(started_at, results, duration_ms, self.cancel.is_cancelled());

        info!(
            "Check results: {} passed, {} failed, {} skipped ({} ms)",
            report.summary.passed, report.summary.failed, report.summary.skipped, duration_ms
        );

        Ok(report)
    }

    /// Run a single check. Never fails: transport errors and assertion
    /// failures are folded into the result.
    pub async fn run_check(&self, spec: &CheckSpec, fetcher: &dyn Fetcher) -> CheckResult {
        if self.cancel.is_cancelled() {
            return CheckResult::skipped(spec);
        }

        let options = self.fetch_options(spec);
        let start = Instant::now();

        debug!(
            "Dispatching {} check {} (timeout {} ms)",
            spec.mode,
            spec.target,
            options.timeout.as_millis()
        );

        let observed = self.dispatch(spec, fetcher, &options).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match observed {
            Ok(observed) => {
                let failures = evaluate_all(&spec.assertions(), &observed);
                CheckResult::evaluated(spec, observed, failures, duration_ms)
            }
            Err(err) => {
                warn!("Transport failure for {}: {}", spec.display_name(), err);
                CheckResult::transport_failure(spec, &err, duration_ms)
            }
        }
    }

    /// Fetch with the check timeout plus the fetcher's startup allowance
    /// as the outer bound
    async fn dispatch(
        &self,
        spec: &CheckSpec,
        fetcher: &dyn Fetcher,
        options: &FetchOptions,
    ) -> Result<Observation, TransportError> {
        let bound = options.timeout + fetcher.startup_allowance(spec.mode);
        let expired = |_: tokio::time::error::Elapsed| TransportError::Timeout(options.timeout);
        match spec.mode {
            CheckMode::Http => {
                let fetch = fetcher.fetch_http(&spec.target, options);
                tokio::time::timeout(bound, fetch)
                    .await
                    .map_err(expired)?
                    .map(Observation::from)
            }
            CheckMode::Ui => {
                let navigation = fetcher.navigate(&spec.target, options);
                tokio::time::timeout(bound, navigation)
                    .await
                    .map_err(expired)?
                    .map(Observation::from)
            }
        }
    }

    /// Per-check options. The timeout is the latency bound plus grace when
    /// a bound is set, the configured default otherwise.
    pub fn fetch_options(&self, spec: &CheckSpec) -> FetchOptions {
        let timeout = match spec.max_response_time_ms {
            Some(ms) => Duration::from_millis(ms) + self.config.timeout_grace(),
            None => self.config.default_timeout(),
        };

        FetchOptions {
            timeout,
            follow_redirects: spec.follow_redirects,
            probe_selectors: spec.expected_visible.clone(),
        }
    }
}
