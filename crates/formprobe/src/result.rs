//! Result and error types for formprobe.
//!
//! Every page-object step returns [`ProbeResult`]. Nothing is recovered
//! locally: an error fails the attempt, and the runner decides whether the
//! scenario is retried in a fresh context.

use thiserror::Error;

/// Result type for formprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser or WebDriver session could not be started
    #[error("Failed to launch {engine}: {message}")]
    BrowserLaunchError {
        /// Engine profile name
        engine: String,
        /// Error message
        message: String,
    },

    /// Low-level driver command failed
    #[error("Driver error: {message}")]
    DriverError {
        /// Error message
        message: String,
    },

    /// In-page script returned something unusable
    #[error("Page script failed: {message}")]
    ScriptError {
        /// Error message
        message: String,
    },

    /// Page did not load, or did not reach its expected URL and landmark
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Target element never became actionable
    #[error("{locator} was not {condition} within {timeout_ms}ms (observed: {observed})")]
    ElementNotReady {
        /// Locator description
        locator: String,
        /// Readiness condition that was awaited
        condition: String,
        /// Action timeout in milliseconds
        timeout_ms: u64,
        /// Last observed state of the locator
        observed: String,
    },

    /// Consent control was clicked but never reported a checked state
    #[error("Consent \"{consent}\" was not confirmed (observed: {observed})")]
    ConsentNotConfirmed {
        /// Consent label
        consent: String,
        /// Last observed state of the control
        observed: String,
    },

    /// Submit button never became enabled
    #[error("Submit control {locator} was not enabled within {timeout_ms}ms")]
    SubmitUnavailable {
        /// Locator description
        locator: String,
        /// Action timeout in milliseconds
        timeout_ms: u64,
    },

    /// Expected DOM state did not appear within the timeout
    #[error("Expected {expectation} within {timeout_ms}ms (last observed: {last_observed})")]
    AssertionTimeout {
        /// Human-readable expectation
        expectation: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Last observed value relevant to the assertion
        last_observed: String,
    },

    /// Whole scenario attempt exceeded its budget
    #[error("Scenario {scenario} timed out after {ms}ms")]
    ScenarioTimeout {
        /// Scenario name
        scenario: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Suite was cancelled before the attempt finished
    #[error("Cancelled")]
    Cancelled,

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    ConfigError {
        /// Error message
        message: String,
    },

    /// Image processing error (decoding, resizing, encoding)
    #[error("Image processing failed: {message}")]
    ImageProcessing {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::DriverError {
            message: message.into(),
        }
    }

    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Create a navigation error
    #[must_use]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NavigationError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Last DOM observation carried by the error, if any
    #[must_use]
    pub fn observed(&self) -> Option<&str> {
        match self {
            Self::ElementNotReady { observed, .. } | Self::ConsentNotConfirmed { observed, .. } => {
                Some(observed)
            }
            Self::AssertionTimeout { last_observed, .. } => Some(last_observed),
            _ => None,
        }
    }

    /// Short machine-readable kind, used in traces and reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BrowserLaunchError { .. } => "browser_launch",
            Self::DriverError { .. } => "driver",
            Self::ScriptError { .. } => "script",
            Self::NavigationError { .. } => "navigation",
            Self::ElementNotReady { .. } => "element_not_ready",
            Self::ConsentNotConfirmed { .. } => "consent_not_confirmed",
            Self::SubmitUnavailable { .. } => "submit_unavailable",
            Self::AssertionTimeout { .. } => "assertion_timeout",
            Self::ScenarioTimeout { .. } => "scenario_timeout",
            Self::Cancelled => "cancelled",
            Self::ConfigError { .. } => "config",
            Self::ImageProcessing { .. } => "image",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}
