//! Step journal and failure artifacts.
//!
//! Every attempt keeps a [`Journal`] of the steps it ran. When the final
//! attempt of a scenario fails, the runner turns the journal into
//! `trace.json` next to a screenshot and the step-by-step GIF:
//!
//! ```text
//! <output>/<engine>/<scenario>/
//! ├── screenshot.png
//! ├── video.gif
//! └── trace.json
//! ```

use crate::config::Engine;
use crate::driver::Driver;
use crate::media::GifRecorder;
use crate::result::ProbeResult;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Screenshot file name
pub const SCREENSHOT_FILE: &str = "screenshot.png";
/// GIF file name
pub const VIDEO_FILE: &str = "video.gif";
/// Trace file name
pub const TRACE_FILE: &str = "trace.json";

// =============================================================================
// JOURNAL
// =============================================================================

/// How a step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step returned `Ok`
    Passed,
    /// Step returned an error
    Failed,
    /// Step was still running when the attempt was stopped
    Interrupted,
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Page-object operation name
    pub name: String,
    /// Offset from the start of the attempt
    pub started_ms: u64,
    /// Time spent in the step
    pub duration_ms: u64,
    /// Outcome
    pub status: StepStatus,
    /// Error text for failed or interrupted steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
struct FrameCapture {
    recorder: GifRecorder,
    driver: Arc<dyn Driver>,
}

/// Ordered record of the steps one attempt ran
#[derive(Debug)]
pub struct Journal {
    started: Instant,
    steps: Vec<StepRecord>,
    pending: Option<(String, Instant)>,
    capture: Option<FrameCapture>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    /// Empty journal, clock starts now
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            steps: Vec::new(),
            pending: None,
            capture: None,
        }
    }

    /// Capture a GIF frame from `driver` after every step
    #[must_use]
    pub fn with_recorder(mut self, recorder: GifRecorder, driver: Arc<dyn Driver>) -> Self {
        self.capture = Some(FrameCapture { recorder, driver });
        self
    }

    /// Run `step` and record its name, timing and outcome
    pub async fn step<T, F>(&mut self, name: &str, step: F) -> ProbeResult<T>
    where
        F: Future<Output = ProbeResult<T>>,
    {
        let begun = Instant::now();
        self.pending = Some((name.to_string(), begun));
        debug!(step = name, "step started");

        let result = step.await;

        self.pending = None;
        self.steps.push(StepRecord {
            name: name.to_string(),
            started_ms: millis(begun.duration_since(self.started)),
            duration_ms: millis(begun.elapsed()),
            status: if result.is_ok() {
                StepStatus::Passed
            } else {
                StepStatus::Failed
            },
            error: result.as_ref().err().map(ToString::to_string),
        });
        self.capture_frame(name).await;
        result
    }

    /// Record the step that was running when the attempt was stopped
    pub fn interrupt(&mut self, reason: &str) {
        if let Some((name, begun)) = self.pending.take() {
            self.steps.push(StepRecord {
                name,
                started_ms: millis(begun.duration_since(self.started)),
                duration_ms: millis(begun.elapsed()),
                status: StepStatus::Interrupted,
                error: Some(reason.to_string()),
            });
        }
    }

    /// Recorded steps, in order
    #[must_use]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Name of the step in flight, if any
    #[must_use]
    pub fn pending_step(&self) -> Option<&str> {
        self.pending.as_ref().map(|(name, _)| name.as_str())
    }

    /// Frames recorded so far
    #[must_use]
    pub fn recorder(&self) -> Option<&GifRecorder> {
        self.capture.as_ref().map(|c| &c.recorder)
    }

    async fn capture_frame(&mut self, label: &str) {
        let Some(capture) = self.capture.as_mut() else {
            return;
        };
        match capture.driver.screenshot().await {
            Ok(png) => {
                if let Err(e) = capture.recorder.capture_png(label, &png) {
                    warn!(step = label, error = %e, "frame skipped");
                }
            }
            Err(e) => warn!(step = label, error = %e, "frame screenshot failed"),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// TRACE AND ARTIFACT FILES
// =============================================================================

/// Contents of `trace.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFile {
    /// Engine profile
    pub engine: Engine,
    /// Scenario name
    pub scenario: String,
    /// 1-based attempt number
    pub attempt: u32,
    /// Page URL when the attempt ended
    pub url: Option<String>,
    /// Error kind
    pub error_kind: Option<String>,
    /// Error message
    pub error: Option<String>,
    /// Last DOM observation tied to the failing assertion
    pub last_observed: Option<String>,
    /// Rendered body text when the attempt ended
    pub dom_text: Option<String>,
    /// Steps in the order they ran
    pub steps: Vec<StepRecord>,
}

/// What a failed attempt left behind
#[derive(Debug, Default)]
pub struct FailureCapture {
    /// PNG screenshot
    pub screenshot: Option<Vec<u8>>,
    /// Encoded GIF
    pub video: Option<Vec<u8>>,
}

/// Paths of the artifacts written for a failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Screenshot path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
    /// GIF path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<PathBuf>,
    /// Trace path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Whether nothing was written
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.screenshot.is_none() && self.video.is_none() && self.trace.is_none()
    }

    /// Written paths, in a fixed order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.screenshot, &self.video, &self.trace]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }
}

/// Directory holding one scenario's artifacts for one engine
#[must_use]
pub fn artifact_dir(output: &Path, engine: Engine, scenario: &str) -> PathBuf {
    output.join(engine.name()).join(scenario)
}

/// Write the trace and whatever media was captured into `dir`
pub async fn write_failure_artifacts(
    dir: &Path,
    trace: &TraceFile,
    capture: FailureCapture,
) -> ProbeResult<ArtifactPaths> {
    tokio::fs::create_dir_all(dir).await?;
    let mut paths = ArtifactPaths::default();

    if let Some(png) = capture.screenshot.filter(|b| !b.is_empty()) {
        let path = dir.join(SCREENSHOT_FILE);
        tokio::fs::write(&path, png).await?;
        paths.screenshot = Some(path);
    }
    if let Some(gif) = capture.video.filter(|b| !b.is_empty()) {
        let path = dir.join(VIDEO_FILE);
        tokio::fs::write(&path, gif).await?;
        paths.video = Some(path);
    }

    let path = dir.join(TRACE_FILE);
    tokio::fs::write(&path, serde_json::to_vec_pretty(trace)?).await?;
    paths.trace = Some(path);

    Ok(paths)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use crate::media::GifConfig;
    use crate::result::ProbeError;

    mod journal_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_records_steps_in_order() {
            let mut journal = Journal::new();
            journal.step("navigate", async { Ok(()) }).await.unwrap();
            let err = journal
                .step("submit", async {
                    tokio::time::sleep(Duration::from_millis(120)).await;
                    Err::<(), _>(ProbeError::driver("detached"))
                })
                .await
                .unwrap_err();
            assert!(err.to_string().contains("detached"));

            let steps = journal.steps();
            assert_eq!(steps.len(), 2);
            assert_eq!(steps[0].status, StepStatus::Passed);
            assert_eq!(steps[1].name, "submit");
            assert_eq!(steps[1].status, StepStatus::Failed);
            assert_eq!(steps[1].duration_ms, 120);
            assert!(journal.pending_step().is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_dropped_step_is_interrupted() {
            let mut journal = Journal::new();
            let stalled = journal.step("accept_terms", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            });
            assert!(tokio::time::timeout(Duration::from_millis(10), stalled)
                .await
                .is_err());
            assert_eq!(journal.pending_step(), Some("accept_terms"));

            journal.interrupt("scenario timed out");
            let last = journal.steps().last().unwrap();
            assert_eq!(last.status, StepStatus::Interrupted);
            assert_eq!(last.error.as_deref(), Some("scenario timed out"));
        }

        #[tokio::test]
        async fn test_bad_screenshot_does_not_fail_step() {
            let driver = Arc::new(MockDriver::new().with_screenshot(vec![1, 2, 3]));
            let mut journal =
                Journal::new().with_recorder(GifRecorder::new(GifConfig::new(4, 4)), driver);
            journal.step("navigate", async { Ok(()) }).await.unwrap();
            assert!(journal.recorder().unwrap().is_empty());
        }
    }

    mod file_tests {
        use super::*;

        fn trace() -> TraceFile {
            TraceFile {
                engine: Engine::Webkit,
                scenario: "rejects_password_mismatch".to_string(),
                attempt: 2,
                url: Some("http://localhost:8080/".to_string()),
                error_kind: Some("assertion_timeout".to_string()),
                error: Some("Expected ...".to_string()),
                last_observed: Some("\"\"".to_string()),
                dom_text: None,
                steps: Vec::new(),
            }
        }

        #[test]
        fn test_artifact_dir_layout() {
            let dir = artifact_dir(Path::new("out"), Engine::Gecko, "submits_valid_registration");
            assert_eq!(dir, Path::new("out/firefox/submits_valid_registration"));
        }

        #[tokio::test]
        async fn test_writes_only_captured_media() {
            let tmp = tempfile::tempdir().unwrap();
            let dir = tmp.path().join("webkit").join("rejects_password_mismatch");
            let paths = write_failure_artifacts(
                &dir,
                &trace(),
                FailureCapture {
                    screenshot: Some(vec![0x89, b'P', b'N', b'G']),
                    video: None,
                },
            )
            .await
            .unwrap();

            assert!(dir.join(SCREENSHOT_FILE).exists());
            assert!(!dir.join(VIDEO_FILE).exists());
            assert!(paths.video.is_none());
            assert_eq!(paths.iter().count(), 2);

            let written: TraceFile =
                serde_json::from_slice(&std::fs::read(dir.join(TRACE_FILE)).unwrap()).unwrap();
            assert_eq!(written, trace());
        }
    }
}
