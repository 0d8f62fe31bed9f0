//! Browsing context handle.
//!
//! A [`Page`] wraps one isolated context for one scenario attempt. It hands
//! out locators pre-configured with the action timeout and owns navigation,
//! which runs under the navigation timeout.

use crate::config::Timeouts;
use crate::driver::Driver;
use crate::locator::{Locator, Role, Selector};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitOptions;
use std::sync::Arc;
use tracing::debug;

/// One isolated browsing context
#[derive(Debug, Clone)]
pub struct Page {
    driver: Arc<dyn Driver>,
    timeouts: Timeouts,
}

impl Page {
    /// Wrap a driver for a fresh context
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, timeouts: Timeouts) -> Self {
        Self { driver, timeouts }
    }

    /// Timeouts in effect for this context
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Wait options for actions and assertions
    #[must_use]
    pub const fn action_wait(&self) -> WaitOptions {
        WaitOptions::action(&self.timeouts)
    }

    /// Wait options for navigation checks
    #[must_use]
    pub const fn navigation_wait(&self) -> WaitOptions {
        WaitOptions::navigation(&self.timeouts)
    }

    /// Load `url`, bounded by the navigation timeout
    pub async fn goto(&self, url: &str) -> ProbeResult<()> {
        debug!(url, "goto");
        match tokio::time::timeout(self.timeouts.navigation(), self.driver.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e @ ProbeError::NavigationError { .. })) => Err(e),
            Ok(Err(other)) => Err(ProbeError::navigation(url, other.to_string())),
            Err(_) => Err(ProbeError::navigation(
                url,
                format!(
                    "page did not load within {}ms",
                    self.timeouts.navigation_ms
                ),
            )),
        }
    }

    /// Current URL
    pub async fn url(&self) -> ProbeResult<String> {
        self.driver.current_url().await
    }

    /// Locator for any selector
    #[must_use]
    pub fn locator(&self, selector: Selector) -> Locator {
        Locator::new(Arc::clone(&self.driver), selector, self.action_wait())
    }

    /// CSS locator
    #[must_use]
    pub fn css(&self, css: impl Into<String>) -> Locator {
        self.locator(Selector::css(css))
    }

    /// Locator by placeholder containment
    #[must_use]
    pub fn get_by_placeholder(&self, text: impl Into<String>) -> Locator {
        self.locator(Selector::placeholder(text))
    }

    /// Locator by exact placeholder
    #[must_use]
    pub fn get_by_placeholder_exact(&self, text: impl Into<String>) -> Locator {
        self.locator(Selector::placeholder_exact(text))
    }

    /// Locator by role
    #[must_use]
    pub fn get_by_role(&self, role: Role) -> Locator {
        self.locator(Selector::role(role))
    }

    /// Locator by role and accessible name
    #[must_use]
    pub fn get_by_role_named(&self, role: Role, name: impl Into<String>) -> Locator {
        self.locator(Selector::role_named(role, name))
    }

    /// Rendered body text, for diagnostics
    pub async fn body_text(&self) -> ProbeResult<String> {
        let body = self.driver.query(&Selector::css("body")).await?;
        Ok(body.into_iter().next().map(|el| el.text).unwrap_or_default())
    }

    /// PNG screenshot
    pub async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        self.driver.screenshot().await
    }

    /// Tear down the context
    pub async fn close(&self) -> ProbeResult<()> {
        self.driver.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{ElementState, MockDriver};

    #[tokio::test]
    async fn test_locators_use_action_timeout() {
        let timeouts = Timeouts {
            action_ms: 1_234,
            ..Timeouts::default()
        };
        let page = Page::new(Arc::new(MockDriver::new()), timeouts);
        let locator = page.get_by_placeholder("Imię");
        assert_eq!(locator.wait_options().timeout_ms, 1_234);
        assert_eq!(locator.selector(), &Selector::placeholder("Imię"));
    }

    #[tokio::test]
    async fn test_goto_maps_driver_failure_to_navigation_error() {
        let driver = MockDriver::new().with_failing_goto("net::ERR_CONNECTION_REFUSED");
        let page = Page::new(Arc::new(driver), Timeouts::default());
        let err = page.goto("http://localhost:8080/").await.unwrap_err();
        match err {
            ProbeError::NavigationError { url, message } => {
                assert_eq!(url, "http://localhost:8080/");
                assert!(message.contains("ERR_CONNECTION_REFUSED"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_body_text() {
        let driver = MockDriver::new().with_element(
            &Selector::css("body"),
            ElementState::new("body").with_text("Rejestracja"),
        );
        let page = Page::new(Arc::new(driver), Timeouts::default());
        assert_eq!(page.body_text().await.unwrap(), "Rejestracja");
    }
}
