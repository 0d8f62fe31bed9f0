//! Suite configuration
//!
//! A [`SuiteConfig`] value is built once (by the CLI, or directly in tests)
//! and passed into the runner. Nothing reads the environment from here on.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default system-under-test address
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default per-action readiness timeout (5 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Default navigation timeout (10 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 10_000;

/// Default whole-scenario timeout (30 seconds)
pub const DEFAULT_SCENARIO_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Upper bound on the default worker count
pub const MAX_DEFAULT_WORKERS: usize = 4;

/// Default Gecko WebDriver endpoint (geckodriver)
pub const DEFAULT_GECKO_WEBDRIVER: &str = "http://localhost:4444";

/// Default WebKit WebDriver endpoint (WebKitWebDriver)
pub const DEFAULT_WEBKIT_WEBDRIVER: &str = "http://localhost:4445";

// =============================================================================
// ENGINE PROFILES
// =============================================================================

/// Browser engine profile. Every profile runs the same scenario catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Chromium over the Chrome DevTools Protocol
    Chromium,
    /// Gecko (Firefox) over WebDriver
    #[serde(rename = "firefox")]
    Gecko,
    /// WebKit over WebDriver
    Webkit,
}

impl Engine {
    /// All profiles, in report order
    pub const ALL: [Self; 3] = [Self::Chromium, Self::Gecko, Self::Webkit];

    /// Profile name as used on the command line and in reports
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Gecko => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Engine {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "firefox" | "gecko" => Ok(Self::Gecko),
            "webkit" | "safari" => Ok(Self::Webkit),
            other => Err(ProbeError::config(format!(
                "unknown engine profile '{other}' (expected chromium, firefox or webkit)"
            ))),
        }
    }
}

// =============================================================================
// TIMEOUTS
// =============================================================================

/// The three independent timeout classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Element readiness and assertion polling
    pub action_ms: u64,
    /// Page load plus landing checks
    pub navigation_ms: u64,
    /// Whole scenario attempt
    pub scenario_ms: u64,
    /// Polling interval shared by every wait
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: DEFAULT_ACTION_TIMEOUT_MS,
            navigation_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            scenario_ms: DEFAULT_SCENARIO_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Timeouts {
    /// Action timeout as Duration
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Navigation timeout as Duration
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Scenario timeout as Duration
    #[must_use]
    pub const fn scenario(&self) -> Duration {
        Duration::from_millis(self.scenario_ms)
    }
}

// =============================================================================
// SUITE CONFIG
// =============================================================================

/// Everything the runner needs to execute the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Base URL of the registration page
    pub base_url: String,
    /// Timeout classes
    pub timeouts: Timeouts,
    /// Extra attempts after a failure, each in a fresh context
    pub retries: u32,
    /// Concurrent scenarios per engine
    pub workers: usize,
    /// Directory for failure artifacts and reports
    pub output_dir: PathBuf,
    /// Run browsers without a window
    pub headless: bool,
    /// Record a GIF of each attempt's steps for failure artifacts
    pub video: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Chromium executable (None = auto-detect)
    pub chrome_executable: Option<PathBuf>,
    /// Disable the Chromium sandbox (containers/CI)
    pub no_sandbox: bool,
    /// Gecko WebDriver endpoint
    pub gecko_webdriver: String,
    /// WebKit WebDriver endpoint
    pub webkit_webdriver: String,
    /// WebKit browser binary passed to WebKitWebDriver (None = driver default)
    pub webkit_binary: Option<PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeouts: Timeouts::default(),
            retries: 1,
            workers: default_workers(),
            output_dir: PathBuf::from("target/formprobe"),
            headless: true,
            video: true,
            viewport_width: 1280,
            viewport_height: 720,
            chrome_executable: None,
            no_sandbox: false,
            gecko_webdriver: DEFAULT_GECKO_WEBDRIVER.to_string(),
            webkit_webdriver: DEFAULT_WEBKIT_WEBDRIVER.to_string(),
            webkit_binary: None,
        }
    }
}

impl SuiteConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set all timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set retry budget
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set worker count (0 = default)
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 {
            default_workers()
        } else {
            workers
        };
        self
    }

    /// Set output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Enable or disable step video capture
    #[must_use]
    pub const fn with_video(mut self, video: bool) -> Self {
        self.video = video;
        self
    }

    /// Set Chromium executable
    #[must_use]
    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    /// Disable the Chromium sandbox
    #[must_use]
    pub const fn with_no_sandbox(mut self, no_sandbox: bool) -> Self {
        self.no_sandbox = no_sandbox;
        self
    }

    /// Set Gecko WebDriver endpoint
    #[must_use]
    pub fn with_gecko_webdriver(mut self, url: impl Into<String>) -> Self {
        self.gecko_webdriver = url.into();
        self
    }

    /// Set WebKit WebDriver endpoint
    #[must_use]
    pub fn with_webkit_webdriver(mut self, url: impl Into<String>) -> Self {
        self.webkit_webdriver = url.into();
        self
    }

    /// Set WebKit browser binary
    #[must_use]
    pub fn with_webkit_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.webkit_binary = Some(path.into());
        self
    }

    /// The registration page address: base URL with exactly one trailing slash
    #[must_use]
    pub fn entry_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// Check invariants the runner relies on
    pub fn validate(&self) -> ProbeResult<()> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProbeError::config(format!(
                "base URL must be http(s), got '{}'",
                self.base_url
            )));
        }
        if self.workers == 0 {
            return Err(ProbeError::config("workers must be at least 1"));
        }
        let t = &self.timeouts;
        if t.action_ms == 0 || t.navigation_ms == 0 || t.scenario_ms == 0 {
            return Err(ProbeError::config("timeouts must be greater than zero"));
        }
        if t.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll interval must be greater than zero"));
        }
        Ok(())
    }
}

/// min(4, available parallelism)
#[must_use]
// NonZero::get as a path needs 1.79, MSRV is 1.75
#[allow(clippy::redundant_closure_for_method_calls)]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}
