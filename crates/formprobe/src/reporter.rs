//! Suite reporting.
//!
//! A [`SuiteReport`] holds one [`ScenarioReport`] per (engine, scenario)
//! pair and renders it three ways: plain text for the terminal, a
//! self-contained HTML page and JUnit XML for CI. `results.json` is the
//! serde serialisation of the report itself.

use crate::artifacts::ArtifactPaths;
use crate::config::Engine;
use crate::result::{ProbeError, ProbeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// HTML report file name
pub const HTML_REPORT: &str = "report.html";
/// JSON results file name
pub const JSON_RESULTS: &str = "results.json";
/// JUnit XML file name
pub const JUNIT_REPORT: &str = "junit.xml";

/// Final status of one scenario on one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// First attempt passed
    Passed,
    /// Passed after at least one failed attempt
    Flaky,
    /// Every attempt failed
    Failed,
    /// Stopped or never started because the suite was cancelled
    Cancelled,
}

impl ScenarioStatus {
    /// Label used in text output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Flaky => "FLAKY",
            Self::Failed => "FAIL",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether this status fails the run
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }

    const fn css_class(&self) -> &'static str {
        match self {
            Self::Passed => "pass",
            Self::Flaky => "flaky",
            Self::Failed => "fail",
            Self::Cancelled => "skip",
        }
    }
}

/// Outcome of one scenario on one engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Engine profile
    pub engine: Engine,
    /// Scenario name
    pub scenario: String,
    /// Scenario title
    pub title: String,
    /// Final status
    pub status: ScenarioStatus,
    /// Attempts made (0 if never started)
    pub attempts: u32,
    /// Wall time over all attempts
    pub duration_ms: u64,
    /// Error of the last failed attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Last DOM observation tied to the failing step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_observed: Option<String>,
    /// Files captured for the final failure
    #[serde(default, skip_serializing_if = "ArtifactPaths::is_empty")]
    pub artifacts: ArtifactPaths,
}

impl ScenarioReport {
    /// Report with no error attached
    #[must_use]
    pub fn new(
        engine: Engine,
        scenario: impl Into<String>,
        title: impl Into<String>,
        status: ScenarioStatus,
    ) -> Self {
        Self {
            engine,
            scenario: scenario.into(),
            title: title.into(),
            status,
            attempts: 0,
            duration_ms: 0,
            error: None,
            error_kind: None,
            last_observed: None,
            artifacts: ArtifactPaths::default(),
        }
    }

    /// Set attempt count and duration
    #[must_use]
    pub const fn with_timing(mut self, attempts: u32, duration_ms: u64) -> Self {
        self.attempts = attempts;
        self.duration_ms = duration_ms;
        self
    }

    /// Attach an error
    #[must_use]
    pub fn with_error(mut self, error: &ProbeError) -> Self {
        self.error = Some(error.to_string());
        self.error_kind = Some(error.kind().to_string());
        self.last_observed = error.observed().map(ToString::to_string);
        self
    }

    /// Attach artifact paths
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: ArtifactPaths) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// One line for terminal output
    #[must_use]
    pub fn line(&self) -> String {
        format!(
            "{:<9} {:<8} {} ({:.2}s, {} attempt{})",
            self.status.label(),
            self.engine.name(),
            self.scenario,
            self.duration_ms as f64 / 1000.0,
            self.attempts,
            if self.attempts == 1 { "" } else { "s" }
        )
    }
}

/// Results of one suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// System under test
    pub base_url: String,
    /// Wall time of the whole run
    pub duration_ms: u64,
    /// Per (engine, scenario) results, engines in run order
    pub results: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Assemble a report
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        results: Vec<ScenarioReport>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            base_url: base_url.into(),
            duration_ms,
            results,
        }
    }

    /// Number of results with `status`
    #[must_use]
    pub fn count(&self, status: ScenarioStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Total results
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Results that fail the run
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.results
            .iter()
            .filter(|r| r.status.is_failure())
            .collect()
    }

    /// False if anything failed or was cancelled on any engine
    #[must_use]
    pub fn exit_ok(&self) -> bool {
        !self.results.iter().any(|r| r.status.is_failure())
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} flaky, {} failed, {} cancelled of {} in {:.2}s",
            self.count(ScenarioStatus::Passed),
            self.count(ScenarioStatus::Flaky),
            self.count(ScenarioStatus::Failed),
            self.count(ScenarioStatus::Cancelled),
            self.total(),
            self.duration_ms as f64 / 1000.0
        )
    }

    /// Plain-text listing with failure details
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for result in &self.results {
            out.push_str(&result.line());
            out.push('\n');
        }
        let failures = self.failures();
        if !failures.is_empty() {
            out.push('\n');
            for result in failures {
                out.push_str(&format!("{} [{}]\n", result.scenario, result.engine));
                if let Some(error) = &result.error {
                    out.push_str(&format!("  {error}\n"));
                }
                for path in result.artifacts.iter() {
                    out.push_str(&format!("  artifact: {}\n", path.display()));
                }
            }
        }
        out.push('\n');
        out.push_str(&self.summary());
        out.push('\n');
        out
    }

    /// Render HTML report content
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();

        html.push_str(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>formprobe report</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
        }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .progress-bar { background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }
        .passed { background: #4caf50; height: 100%; }
        .test { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .test.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .test.flaky { background: #fffde7; border-left: 4px solid #fbc02d; }
        .test.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .test.skip { background: #fff3e0; border-left: 4px solid #ff9800; }
        .error { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
        .observed { font-family: monospace; white-space: pre-wrap; color: #555; }
        .artifacts img { max-width: 480px; border: 1px solid #ddd; margin: 5px 5px 0 0; }
    </style>
</head>
<body>
"#,
        );

        let ok = self.count(ScenarioStatus::Passed) + self.count(ScenarioStatus::Flaky);
        let rate = if self.results.is_empty() {
            100.0
        } else {
            ok as f64 * 100.0 / self.results.len() as f64
        };
        html.push_str(&format!(
            r#"<div class="summary">
    <h1>Registration form acceptance</h1>
    <p>Run {} against {} at {}</p>
    <h2>{}</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
</div>
"#,
            self.run_id,
            escape_html(&self.base_url),
            self.started_at.to_rfc3339(),
            escape_html(&self.summary()),
            rate
        ));

        let mut engines: Vec<Engine> = Vec::new();
        for result in &self.results {
            if !engines.contains(&result.engine) {
                engines.push(result.engine);
            }
        }

        for engine in engines {
            html.push_str(&format!("<h2>{engine}</h2>\n"));
            for result in self.results.iter().filter(|r| r.engine == engine) {
                html.push_str(&format!(
                    r#"<div class="test {}">
    <strong>{}</strong> {} - {} ({:.2}s, attempts: {})
"#,
                    result.status.css_class(),
                    escape_html(&result.scenario),
                    escape_html(&result.title),
                    result.status.label(),
                    result.duration_ms as f64 / 1000.0,
                    result.attempts
                ));
                if let Some(error) = &result.error {
                    html.push_str(&format!(
                        "    <div class=\"error\">{}</div>\n",
                        escape_html(error)
                    ));
                }
                if let Some(observed) = &result.last_observed {
                    html.push_str(&format!(
                        "    <div class=\"observed\">observed: {}</div>\n",
                        escape_html(observed)
                    ));
                }
                if !result.artifacts.is_empty() {
                    html.push_str(r#"    <div class="artifacts">"#);
                    for path in [&result.artifacts.screenshot, &result.artifacts.video]
                        .into_iter()
                        .flatten()
                    {
                        html.push_str(&format!(
                            r#"<img src="{}" alt="">"#,
                            escape_html(&link(path))
                        ));
                    }
                    if let Some(trace) = &result.artifacts.trace {
                        html.push_str(&format!(
                            r#"<a href="{}">trace.json</a>"#,
                            escape_html(&link(trace))
                        ));
                    }
                    html.push_str("</div>\n");
                }
                html.push_str("</div>\n");
            }
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render JUnit XML content, one testsuite per engine
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            "<testsuites name=\"formprobe\" tests=\"{}\" failures=\"{}\" \
             skipped=\"{}\" time=\"{:.3}\">\n",
            self.total(),
            self.count(ScenarioStatus::Failed),
            self.count(ScenarioStatus::Cancelled),
            self.duration_ms as f64 / 1000.0
        ));
        for engine in Engine::ALL {
            let results: Vec<_> = self.results.iter().filter(|r| r.engine == engine).collect();
            if results.is_empty() {
                continue;
            }
            let with_status = |status| results.iter().filter(|r| r.status == status).count();
            let failed = with_status(ScenarioStatus::Failed);
            let skipped = with_status(ScenarioStatus::Cancelled);
            xml.push_str(&format!(
                "  <testsuite name=\"{engine}\" tests=\"{}\" failures=\"{failed}\" \
                 skipped=\"{skipped}\">\n",
                results.len()
            ));
            for result in results {
                xml.push_str(&format!(
                    r#"    <testcase classname="{engine}" name="{}" time="{:.3}">"#,
                    escape_html(&result.scenario),
                    result.duration_ms as f64 / 1000.0
                ));
                match result.status {
                    ScenarioStatus::Failed => {
                        let message = result.error.as_deref().unwrap_or("failed");
                        xml.push_str(&format!(
                            r#"<failure message="{}">{}</failure>"#,
                            escape_html(message),
                            escape_html(message)
                        ));
                    }
                    ScenarioStatus::Cancelled => xml.push_str("<skipped/>"),
                    ScenarioStatus::Passed | ScenarioStatus::Flaky => {}
                }
                xml.push_str("</testcase>\n");
            }
            xml.push_str("  </testsuite>\n");
        }
        xml.push_str("</testsuites>\n");
        xml
    }

    /// Write `report.html`, `results.json` and `junit.xml` into `dir`
    pub async fn write(&self, dir: &Path) -> ProbeResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;
        let html = dir.join(HTML_REPORT);
        tokio::fs::write(&html, self.render_html()).await?;
        let json = dir.join(JSON_RESULTS);
        tokio::fs::write(&json, serde_json::to_vec_pretty(self)?).await?;
        let junit = dir.join(JUNIT_REPORT);
        tokio::fs::write(&junit, self.render_junit()).await?;
        Ok(vec![html, json, junit])
    }
}

fn link(path: &Path) -> String {
    path.display().to_string()
}

/// Escape text for HTML and XML content and attributes
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
