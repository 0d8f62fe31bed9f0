//! Driver - Engine-Neutral Browser Seam
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Driver (object-safe async trait, one per browsing context)     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐  ┌────────────────┐  ┌──────────────────┐  │
//! │  │ CdpContext     │  │ WebDriverCtx   │  │ MockDriver       │  │
//! │  │ chromiumoxide  │  │ fantoccini     │  │ scripted states  │  │
//! │  └────────────────┘  └────────────────┘  └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drivers never wait. They answer "what matches right now" and "do this to
//! the single match". Waiting is layered on top by locators and assertions.

use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Snapshot of one resolved element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Lowercase tag name
    pub tag: String,
    /// Whitespace-normalised rendered text
    pub text: String,
    /// Has a rendered box and is not hidden by style
    pub visible: bool,
    /// Not disabled (attribute, aria-disabled or disabled fieldset)
    pub enabled: bool,
    /// Accepts typed input
    pub editable: bool,
    /// Checked state for checkbox-like controls, `None` otherwise
    pub checked: Option<bool>,
    /// Current form value (empty for non-form elements)
    pub value: String,
    /// Option values, for `select` elements
    #[serde(default)]
    pub options: Vec<String>,
}

impl ElementState {
    /// Create a visible, enabled element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            visible: true,
            enabled: true,
            ..Default::default()
        }
    }

    /// Set text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set enabled state
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set editable state
    #[must_use]
    pub const fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Set checked state
    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Set value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set select options
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// One-line description used in diagnostics
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "<{}> visible={} enabled={} editable={}",
            self.tag, self.visible, self.enabled, self.editable
        );
        if let Some(checked) = self.checked {
            out.push_str(&format!(" checked={checked}"));
        }
        if !self.text.is_empty() {
            out.push_str(&format!(" text=\"{}\"", crate::text::truncate(&self.text, 80)));
        }
        out
    }
}

/// Mutation performed on exactly one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Replace the value of an input and fire input/change events
    Fill {
        /// New value
        value: String,
    },
    /// Scroll into view and click
    Click,
    /// Choose a `select` option by value
    SelectOption {
        /// Option value
        value: String,
    },
}

impl Action {
    /// Short name for logs and traces
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fill { .. } => "fill",
            Self::Click => "click",
            Self::SelectOption { .. } => "select_option",
        }
    }
}

/// Browser primitives for one isolated browsing context
#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// Navigate and wait for the load to settle
    async fn goto(&self, url: &str) -> ProbeResult<()>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Resolve a selector to the elements it matches right now, in document order
    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementState>>;

    /// Perform an action on the single element the selector matches
    async fn perform(&self, selector: &Selector, action: &Action) -> ProbeResult<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Tear down the browsing context
    async fn close(&self) -> ProbeResult<()>;
}

// =============================================================================
// MOCK DRIVER
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    url: String,
    states: HashMap<String, VecDeque<Vec<ElementState>>>,
    call_history: Vec<String>,
    screenshot: Vec<u8>,
    fail_goto: Option<String>,
    goto_delay: Option<Duration>,
    closed: bool,
}

/// Mock driver for unit testing
///
/// Each selector is given a queue of snapshots. Every `query` pops the next
/// one; the last snapshot repeats forever. Unknown selectors match nothing.
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue successive snapshots for a selector
    #[must_use]
    pub fn with_states(self, selector: &Selector, states: Vec<Vec<ElementState>>) -> Self {
        self.lock()
            .states
            .insert(selector.to_string(), states.into_iter().collect());
        self
    }

    /// A selector that always matches exactly `element`
    #[must_use]
    pub fn with_element(self, selector: &Selector, element: ElementState) -> Self {
        self.with_states(selector, vec![vec![element]])
    }

    /// Report this URL after any navigation
    #[must_use]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.lock().url = url.into();
        self
    }

    /// Make `goto` fail with the given message
    #[must_use]
    pub fn with_failing_goto(self, message: impl Into<String>) -> Self {
        self.lock().fail_goto = Some(message.into());
        self
    }

    /// Make `goto` take this long before returning
    #[must_use]
    pub fn with_goto_delay(self, delay: Duration) -> Self {
        self.lock().goto_delay = Some(delay);
        self
    }

    /// Set screenshot bytes
    #[must_use]
    pub fn with_screenshot(self, png: Vec<u8>) -> Self {
        self.lock().screenshot = png;
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().call_history.iter().any(|c| c.starts_with(prefix))
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked mid-call
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        let delay = self.lock().goto_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        state.call_history.push(format!("goto:{url}"));
        if let Some(message) = state.fail_goto.clone() {
            return Err(ProbeError::navigation(url, message));
        }
        if state.url.is_empty() {
            state.url = url.to_string();
        }
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementState>> {
        let mut state = self.lock();
        let key = selector.to_string();
        state.call_history.push(format!("query:{key}"));
        let Some(queue) = state.states.get_mut(&key) else {
            return Ok(Vec::new());
        };
        let snapshot = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        Ok(snapshot)
    }

    async fn perform(&self, selector: &Selector, action: &Action) -> ProbeResult<()> {
        let detail = match action {
            Action::Fill { value } | Action::SelectOption { value } => format!("={value}"),
            Action::Click => String::new(),
        };
        self.lock()
            .call_history
            .push(format!("{}:{selector}{detail}", action.name()));
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        Ok(self.lock().screenshot.clone())
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.call_history.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}
