//! Progress reporting and result output

use console::{style, Style, Term};
use formprobe::{Engine, RunObserver, ScenarioReport, ScenarioStatus, SuiteReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;

/// Progress on stderr while the suite runs, summary when it ends
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Mutex<Option<ProgressBar>>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: Mutex::new(None),
            use_color,
            quiet,
        }
    }

    fn bar(&self) -> Option<ProgressBar> {
        self.progress_bar.lock().ok().and_then(|pb| pb.clone())
    }

    fn write_line(&self, line: &str) {
        match self.bar() {
            Some(pb) if !pb.is_finished() => pb.println(line),
            _ => {
                let _ = self.term.write_line(line);
            }
        }
    }

    /// Status tag for one result
    #[must_use]
    pub fn status_tag(&self, status: ScenarioStatus) -> String {
        let label = status.label();
        if !self.use_color {
            return format!("{label:<9}");
        }
        let padded = format!("{label:<9}");
        match status {
            ScenarioStatus::Passed => style(padded).green().bold().to_string(),
            ScenarioStatus::Flaky => style(padded).yellow().bold().to_string(),
            ScenarioStatus::Failed => style(padded).red().bold().to_string(),
            ScenarioStatus::Cancelled => style(padded).dim().to_string(),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Finish the current progress bar, if any
    pub fn finish(&self) {
        if let Some(pb) = self.bar() {
            pb.finish_and_clear();
        }
    }

    /// Print every result and the suite summary
    pub fn summary(&self, report: &SuiteReport, output_dir: &Path) {
        self.finish();
        let failed = report.failures().len();
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");
        for result in &report.results {
            if self.quiet && !result.status.is_failure() {
                continue;
            }
            let _ = self.term.write_line(&format!(
                "{} {:<8} {} ({:.2}s, {} attempt{})",
                self.status_tag(result.status),
                result.engine.name(),
                result.scenario,
                result.duration_ms as f64 / 1000.0,
                result.attempts,
                if result.attempts == 1 { "" } else { "s" }
            ));
            if let Some(error) = &result.error {
                if result.status.is_failure() {
                    let _ = self.term.write_line(&format!("    {error}"));
                }
            }
            for path in result.artifacts.iter() {
                let _ = self.term.write_line(&format!("    artifact: {}", path.display()));
            }
        }

        let _ = self.term.write_line("");
        let verdict = if report.exit_ok() { "PASSED" } else { "FAILED" };
        let verdict = if !self.use_color {
            verdict.to_string()
        } else if report.exit_ok() {
            Style::new().green().bold().apply_to(verdict).to_string()
        } else {
            Style::new().red().bold().apply_to(verdict).to_string()
        };
        let _ = self
            .term
            .write_line(&format!("{verdict} {}", report.summary()));
        if !self.quiet {
            let _ = self
                .term
                .write_line(&format!("Reports: {}", output_dir.display()));
        }
    }
}

impl RunObserver for ProgressReporter {
    fn engine_started(&self, engine: Engine, scenarios: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(scenarios as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(engine.name());
        if let Ok(mut slot) = self.progress_bar.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn scenario_finished(&self, report: &ScenarioReport) {
        if report.status.is_failure() || report.status == ScenarioStatus::Flaky {
            self.write_line(&format!(
                "{} {:<8} {}",
                self.status_tag(report.status),
                report.engine.name(),
                report.scenario
            ));
        }
        if let Some(pb) = self.bar() {
            pb.inc(1);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_status_tags_are_aligned() {
        let reporter = ProgressReporter::new(false, false);
        assert_eq!(reporter.status_tag(ScenarioStatus::Passed), "PASS     ");
        assert_eq!(
            reporter.status_tag(ScenarioStatus::Cancelled).len(),
            reporter.status_tag(ScenarioStatus::Flaky).len()
        );
    }

    #[test]
    fn test_quiet_reporter_has_no_bar() {
        let reporter = ProgressReporter::new(false, true);
        reporter.engine_started(Engine::Chromium, 9);
        assert!(reporter.bar().is_none());
    }

    #[test]
    fn test_bar_tracks_finished_scenarios() {
        let reporter = ProgressReporter::new(false, false);
        reporter.engine_started(Engine::Gecko, 2);
        let report = ScenarioReport::new(
            Engine::Gecko,
            "submits_valid_registration",
            "Valid registration is confirmed",
            ScenarioStatus::Passed,
        )
        .with_timing(1, 420);
        reporter.scenario_finished(&report);
        assert_eq!(reporter.bar().unwrap().position(), 1);
        reporter.finish();
    }
}
