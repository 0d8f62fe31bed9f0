//! Suite execution for the `test` command

use crate::commands::TestArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use formprobe::{catalog, filter, CancellationSignal, SuiteReport, SuiteRunner};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the catalog on the selected engines and writes the reports
#[derive(Debug)]
pub struct TestRunner {
    reporter: Arc<ProgressReporter>,
}

impl TestRunner {
    /// Create a new test runner
    #[must_use]
    pub fn new(config: &CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self {
            reporter: Arc::new(reporter),
        }
    }

    /// Run the suite to completion, or until Ctrl-C.
    ///
    /// Returns the report once written; a report that is not
    /// [`SuiteReport::exit_ok`] becomes [`CliError::TestFailures`] in the
    /// caller.
    pub fn run(&self, args: &TestArgs) -> CliResult<SuiteReport> {
        let config = args.suite.to_config();
        config.validate()?;

        let scenarios = filter(catalog(), args.filter.as_deref());
        if scenarios.is_empty() {
            return Err(CliError::config(format!(
                "no scenario matches '{}'",
                args.filter.as_deref().unwrap_or_default()
            )));
        }
        let engines = args.engines();

        self.reporter.info(&format!(
            "{} scenario(s) on {} against {}",
            scenarios.len(),
            engines
                .iter()
                .map(|e| e.name())
                .collect::<Vec<_>>()
                .join(", "),
            config.base_url
        ));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let output_dir = config.output_dir.clone();
        let runner = SuiteRunner::new(config).with_observer(Arc::clone(&self.reporter) as Arc<dyn formprobe::RunObserver>);

        let report = runtime.block_on(async {
            let (handle, signal) = CancellationSignal::channel();
            let reporter = Arc::clone(&self.reporter);
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupted, cancelling the suite");
                    reporter.warning("interrupted, cancelling remaining scenarios");
                    handle.cancel();
                }
            });

            let report = runner.run(&engines, &scenarios, signal).await;
            interrupt.abort();
            let written = report.write(&output_dir).await?;
            info!(files = written.len(), dir = %output_dir.display(), "reports written");
            Ok::<_, CliError>(report)
        })?;

        self.reporter.summary(&report, &output_dir);
        Ok(report)
    }
}
