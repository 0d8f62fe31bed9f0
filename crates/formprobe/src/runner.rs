//! Suite runner.
//!
//! ```text
//! run(engines, scenarios, signal)
//!   for each engine (in order):
//!     launch ──► buffer_unordered(workers) ──► shutdown
//!                  └─ scenario: attempt 1 .. retries + 1
//!                       └─ attempt: new context ─► execute under timeout ─► close
//! ```
//!
//! Every attempt gets its own browsing context, which is closed whatever
//! the outcome. Artifacts are captured only for the attempt that makes a
//! scenario fail for good.

use crate::artifacts::{
    artifact_dir, write_failure_artifacts, ArtifactPaths, FailureCapture, Journal, TraceFile,
};
use crate::browser::{BrowserEngine, Launcher, NativeLauncher};
use crate::config::{Engine, SuiteConfig};
use crate::media::{GifConfig, GifRecorder};
use crate::page::Page;
use crate::registration::RegistrationPage;
use crate::reporter::{ScenarioReport, ScenarioStatus, SuiteReport};
use crate::result::{ProbeError, ProbeResult};
use crate::scenario::Scenario;
use futures::{StreamExt, TryFutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

// =============================================================================
// CANCELLATION
// =============================================================================

/// Cancels a running suite
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    /// Request cancellation; running attempts stop at their next await point
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by the runner to stop early
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    /// Linked handle and signal
    #[must_use]
    pub fn channel() -> (CancellationHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx }, Self { rx })
    }

    /// A signal that never fires
    #[must_use]
    pub fn never() -> Self {
        Self::channel().1
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever otherwise
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}

/// Race `fut` against cancellation
async fn or_cancelled<T>(
    signal: &CancellationSignal,
    fut: impl Future<Output = ProbeResult<T>>,
) -> ProbeResult<T> {
    tokio::select! {
        biased;
        () = signal.cancelled() => Err(ProbeError::Cancelled),
        result = fut => result,
    }
}

// =============================================================================
// OBSERVER
// =============================================================================

/// Progress callbacks, invoked from the runner's task
pub trait RunObserver: Send + Sync + fmt::Debug {
    /// An engine is about to run `scenarios` scenarios
    fn engine_started(&self, _engine: Engine, _scenarios: usize) {}

    /// A scenario reached its final status
    fn scenario_finished(&self, _report: &ScenarioReport) {}
}

#[derive(Debug)]
struct Silent;

impl RunObserver for Silent {}

// =============================================================================
// RUNNER
// =============================================================================

struct AttemptFailure {
    error: ProbeError,
    artifacts: ArtifactPaths,
}

impl From<ProbeError> for AttemptFailure {
    fn from(error: ProbeError) -> Self {
        Self {
            error,
            artifacts: ArtifactPaths::default(),
        }
    }
}

/// Runs the catalog against engine profiles
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    config: SuiteConfig,
    launcher: Arc<dyn Launcher>,
    observer: Arc<dyn RunObserver>,
}

impl SuiteRunner {
    /// Runner using real browsers
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            launcher: Arc::new(NativeLauncher),
            observer: Arc::new(Silent),
        }
    }

    /// Use another launcher
    #[must_use]
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Receive progress callbacks
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Configuration in effect
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run every scenario on every engine, engines one after another.
    ///
    /// Never fails: launch errors, scenario failures and cancellation all
    /// end up as statuses in the report.
    pub async fn run(
        &self,
        engines: &[Engine],
        scenarios: &[Scenario],
        signal: CancellationSignal,
    ) -> SuiteReport {
        let started_at = chrono::Utc::now();
        let clock = Instant::now();
        info!(
            base_url = %self.config.base_url,
            engines = engines.len(),
            scenarios = scenarios.len(),
            workers = self.config.workers,
            retries = self.config.retries,
            "suite started"
        );

        let mut results = Vec::with_capacity(engines.len() * scenarios.len());
        for &engine in engines {
            let span = info_span!("engine", engine = %engine);
            results.extend(
                self.run_engine(engine, scenarios, &signal)
                    .instrument(span)
                    .await,
            );
        }

        let report = SuiteReport::new(
            self.config.base_url.clone(),
            started_at,
            millis(clock.elapsed()),
            results,
        );
        info!(summary = %report.summary(), "suite finished");
        report
    }

    async fn run_engine(
        &self,
        engine: Engine,
        scenarios: &[Scenario],
        signal: &CancellationSignal,
    ) -> Vec<ScenarioReport> {
        self.observer.engine_started(engine, scenarios.len());

        let launched = or_cancelled(signal, self.launcher.launch(engine, &self.config)).await;
        let browser = match launched {
            Ok(browser) => browser,
            Err(e) => {
                if matches!(e, ProbeError::Cancelled) {
                    info!("engine skipped, suite cancelled");
                } else {
                    error!(error = %e, "engine failed to launch");
                }
                return scenarios
                    .iter()
                    .map(|scenario| self.finish(self.not_run(engine, scenario, &e)))
                    .collect();
            }
        };
        info!("engine launched");

        let mut results: Vec<(usize, ScenarioReport)> =
            futures::stream::iter(scenarios.iter().enumerate())
                .map(|(index, scenario)| {
                    let browser = Arc::clone(&browser);
                    async move {
                        let report = self
                            .run_scenario(browser.as_ref(), scenario, signal)
                            .instrument(info_span!("scenario", scenario = scenario.name))
                            .await;
                        (index, self.finish(report))
                    }
                })
                .buffer_unordered(self.config.workers.max(1))
                .collect()
                .await;
        results.sort_by_key(|(index, _)| *index);

        if let Err(e) = browser.shutdown().await {
            warn!(error = %e, "engine shutdown failed");
        }
        results.into_iter().map(|(_, report)| report).collect()
    }

    fn finish(&self, report: ScenarioReport) -> ScenarioReport {
        self.observer.scenario_finished(&report);
        report
    }

    fn not_run(&self, engine: Engine, scenario: &Scenario, cause: &ProbeError) -> ScenarioReport {
        let status = if matches!(cause, ProbeError::Cancelled) {
            ScenarioStatus::Cancelled
        } else {
            ScenarioStatus::Failed
        };
        ScenarioReport::new(engine, scenario.name, scenario.title, status).with_error(cause)
    }

    async fn run_scenario(
        &self,
        browser: &dyn BrowserEngine,
        scenario: &Scenario,
        signal: &CancellationSignal,
    ) -> ScenarioReport {
        let engine = browser.engine();
        let clock = Instant::now();
        let max_attempts = self.config.retries.saturating_add(1);
        let mut first_error: Option<ProbeError> = None;

        for attempt in 1..=max_attempts {
            if signal.is_cancelled() {
                return self
                    .not_run(engine, scenario, &ProbeError::Cancelled)
                    .with_timing(attempt - 1, millis(clock.elapsed()));
            }

            let final_attempt = attempt == max_attempts;
            let outcome = self
                .run_attempt(browser, scenario, attempt, final_attempt, signal)
                .instrument(info_span!("attempt", attempt))
                .await;
            let timing = (attempt, millis(clock.elapsed()));

            match outcome {
                Ok(()) => {
                    let status = if first_error.is_some() {
                        warn!(attempts = attempt, "passed after retry");
                        ScenarioStatus::Flaky
                    } else {
                        ScenarioStatus::Passed
                    };
                    let mut report =
                        ScenarioReport::new(engine, scenario.name, scenario.title, status);
                    if let Some(earlier) = &first_error {
                        report = report.with_error(earlier);
                    }
                    return report.with_timing(timing.0, timing.1);
                }
                Err(failure) if matches!(failure.error, ProbeError::Cancelled) => {
                    info!("attempt cancelled");
                    return self
                        .not_run(engine, scenario, &failure.error)
                        .with_timing(timing.0, timing.1);
                }
                Err(failure) if final_attempt => {
                    error!(attempts = attempt, error = %failure.error, "scenario failed");
                    return ScenarioReport::new(
                        engine,
                        scenario.name,
                        scenario.title,
                        ScenarioStatus::Failed,
                    )
                    .with_error(&failure.error)
                    .with_artifacts(failure.artifacts)
                    .with_timing(timing.0, timing.1);
                }
                Err(failure) => {
                    warn!(error = %failure.error, "attempt failed, retrying in a fresh context");
                    first_error.get_or_insert(failure.error);
                }
            }
        }

        // max_attempts >= 1, so the loop always returns
        ScenarioReport::new(engine, scenario.name, scenario.title, ScenarioStatus::Failed)
    }

    async fn run_attempt(
        &self,
        browser: &dyn BrowserEngine,
        scenario: &Scenario,
        attempt: u32,
        capture: bool,
        signal: &CancellationSignal,
    ) -> Result<(), AttemptFailure> {
        let driver = or_cancelled(signal, browser.new_context()).await?;
        debug!("context opened");

        let page = Page::new(Arc::clone(&driver), self.config.timeouts);
        let registration = RegistrationPage::new(page.clone(), self.config.base_url.clone());
        let mut journal = Journal::new();
        if self.config.video {
            let gif = GifConfig::new(
                self.config.viewport_width / 2,
                self.config.viewport_height / 2,
            );
            journal = journal.with_recorder(GifRecorder::new(gif), Arc::clone(&driver));
        }

        let budget = self.config.timeouts.scenario();
        let outcome = or_cancelled(
            signal,
            tokio::time::timeout(budget, scenario.execute(&registration, &mut journal))
                .unwrap_or_else(|_| {
                    Err(ProbeError::ScenarioTimeout {
                        scenario: scenario.name.to_string(),
                        ms: self.config.timeouts.scenario_ms,
                    })
                }),
        )
        .await;

        let artifacts = match &outcome {
            Err(e) => {
                if let Some(step) = journal.pending_step() {
                    debug!(step, "step interrupted");
                }
                journal.interrupt(&e.to_string());
                if capture && !matches!(e, ProbeError::Cancelled) {
                    self.capture_failure(browser.engine(), scenario, attempt, &page, &journal, e)
                        .await
                } else {
                    ArtifactPaths::default()
                }
            }
            Ok(()) => ArtifactPaths::default(),
        };

        if let Err(e) = page.close().await {
            warn!(error = %e, "context teardown failed");
        } else {
            debug!("context closed");
        }

        outcome.map_err(|error| AttemptFailure { error, artifacts })
    }

    async fn capture_failure(
        &self,
        engine: Engine,
        scenario: &Scenario,
        attempt: u32,
        page: &Page,
        journal: &Journal,
        cause: &ProbeError,
    ) -> ArtifactPaths {
        let bound = self.config.timeouts.action();
        let screenshot = bounded(bound, page.screenshot(), "screenshot").await;
        let dom_text = bounded(bound, page.body_text(), "body text").await;
        let url = bounded(bound, page.url(), "url").await;
        let video = journal
            .recorder()
            .filter(|recorder| !recorder.is_empty())
            .and_then(|recorder| match recorder.encode() {
                Ok(gif) => Some(gif),
                Err(e) => {
                    warn!(error = %e, "video not encoded");
                    None
                }
            });

        let trace = TraceFile {
            engine,
            scenario: scenario.name.to_string(),
            attempt,
            url,
            error_kind: Some(cause.kind().to_string()),
            error: Some(cause.to_string()),
            last_observed: cause.observed().map(ToString::to_string),
            dom_text,
            steps: journal.steps().to_vec(),
        };

        let dir = artifact_dir(&self.config.output_dir, engine, scenario.name);
        match write_failure_artifacts(&dir, &trace, FailureCapture { screenshot, video }).await {
            Ok(paths) => {
                debug!(dir = %dir.display(), "artifacts written");
                paths
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "artifacts not written");
                ArtifactPaths::default()
            }
        }
    }
}

/// Best-effort diagnostic read, bounded by `limit`
async fn bounded<T>(
    limit: Duration,
    fut: impl Future<Output = ProbeResult<T>>,
    what: &str,
) -> Option<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!(error = %e, "{what} unavailable");
            None
        }
        Err(_) => {
            warn!("{what} timed out");
            None
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
