//! Browser engines.
//!
//! An engine is launched once per profile and hands out isolated contexts,
//! one per scenario attempt. Chromium is driven over CDP, Gecko and WebKit
//! over WebDriver. Both backends resolve selectors with the same in-page
//! script, so a [`Selector`](crate::Selector) means the same thing on every
//! profile.
//!
//! When compiled without the `browser` feature, [`NativeLauncher`] refuses
//! every launch and only injected launchers can run the suite.

use crate::config::{Engine, SuiteConfig};
use crate::driver::Driver;
use crate::result::ProbeResult;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

#[cfg(feature = "browser")]
mod chromium;
#[cfg(feature = "browser")]
mod webdriver;

#[cfg(feature = "browser")]
pub use chromium::{CdpContext, ChromiumEngine};
#[cfg(feature = "browser")]
pub use webdriver::{WebDriverContext, WebDriverEngine};

/// A running engine that opens isolated browsing contexts
#[async_trait]
pub trait BrowserEngine: Send + Sync + Debug {
    /// Profile this engine serves
    fn engine(&self) -> Engine;

    /// Open a fresh, isolated context
    async fn new_context(&self) -> ProbeResult<Arc<dyn Driver>>;

    /// Stop the engine; contexts still open are torn down with it
    async fn shutdown(&self) -> ProbeResult<()>;
}

/// Starts engines for the runner
#[async_trait]
pub trait Launcher: Send + Sync + Debug {
    /// Launch `engine` configured from `config`
    async fn launch(
        &self,
        engine: Engine,
        config: &SuiteConfig,
    ) -> ProbeResult<Arc<dyn BrowserEngine>>;
}

/// Launches real browsers
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLauncher;

#[cfg(feature = "browser")]
#[async_trait]
impl Launcher for NativeLauncher {
    async fn launch(
        &self,
        engine: Engine,
        config: &SuiteConfig,
    ) -> ProbeResult<Arc<dyn BrowserEngine>> {
        match engine {
            Engine::Chromium => Ok(Arc::new(ChromiumEngine::launch(config).await?)),
            Engine::Gecko | Engine::Webkit => {
                Ok(Arc::new(WebDriverEngine::connect(engine, config).await?))
            }
        }
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl Launcher for NativeLauncher {
    async fn launch(
        &self,
        engine: Engine,
        _config: &SuiteConfig,
    ) -> ProbeResult<Arc<dyn BrowserEngine>> {
        Err(crate::result::ProbeError::BrowserLaunchError {
            engine: engine.to_string(),
            message: "formprobe was built without the `browser` feature".to_string(),
        })
    }
}

/// Wrap an expression so WebDriver's function-body semantics return its value
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub(crate) fn webdriver_body(expression: &str) -> String {
    format!("return (\n{expression}\n);")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webdriver_body_survives_leading_comment() {
        let body = webdriver_body("// resolver\n(() => 1)()");
        assert!(body.starts_with("return (\n// resolver\n"));
        assert!(body.ends_with("\n);"));
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_native_launcher_without_browser_feature() {
        let err = NativeLauncher
            .launch(Engine::Chromium, &SuiteConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("browser"));
    }
}
