//! Chromium over the Chrome DevTools Protocol.
//!
//! One browser process serves the whole profile. Each context is a CDP
//! browser context (separate cookies and storage) with a single page.

use super::BrowserEngine;
use crate::config::{Engine, SuiteConfig};
use crate::driver::{Action, Driver, ElementState};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::script;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
    DisposeBrowserContextParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

fn launch_error(message: impl ToString) -> ProbeError {
    ProbeError::BrowserLaunchError {
        engine: Engine::Chromium.to_string(),
        message: message.to_string(),
    }
}

/// Chromium process with a live CDP connection
#[derive(Debug)]
pub struct ChromiumEngine {
    inner: Arc<Mutex<CdpBrowser>>,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromiumEngine {
    /// Launch Chromium
    pub async fn launch(config: &SuiteConfig) -> ProbeResult<Self> {
        let mut builder =
            CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }

        if config.no_sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(launch_error)?;
        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(launch_error)?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "cdp handler error");
                }
            }
        });

        info!(headless = config.headless, "chromium launched");
        Ok(Self {
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    fn engine(&self) -> Engine {
        Engine::Chromium
    }

    async fn new_context(&self) -> ProbeResult<Arc<dyn Driver>> {
        let browser = self.inner.lock().await;
        let created = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| ProbeError::driver(format!("create browser context: {e}")))?;
        let context_id = created.result.browser_context_id.clone();

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(ProbeError::driver)?;
        let page = browser
            .new_page(target)
            .await
            .map_err(|e| ProbeError::driver(format!("open page: {e}")))?;

        Ok(Arc::new(CdpContext {
            page,
            context_id,
            browser: Arc::clone(&self.inner),
            closed: AtomicBool::new(false),
        }))
    }

    async fn shutdown(&self) -> ProbeResult<()> {
        let mut browser = self.inner.lock().await;
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "chromium did not exit cleanly");
        }
        self.handle.abort();
        closed.map(|_| ()).map_err(|e| ProbeError::driver(e.to_string()))
    }
}

/// One CDP browser context with a single page
#[derive(Debug)]
pub struct CdpContext {
    page: CdpPage,
    context_id: BrowserContextId,
    browser: Arc<Mutex<CdpBrowser>>,
    closed: AtomicBool,
}

impl CdpContext {
    async fn evaluate(&self, expression: String) -> ProbeResult<serde_json::Value> {
        self.page
            .evaluate(expression)
            .await
            .map_err(|e| ProbeError::script(e.to_string()))?
            .into_value::<serde_json::Value>()
            .map_err(|e| ProbeError::script(e.to_string()))
    }
}

#[async_trait]
impl Driver for CdpContext {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ProbeError::navigation(url, e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementState>> {
        let value = self.evaluate(script::query_expression(selector)?).await?;
        script::decode_query(value)
    }

    async fn perform(&self, selector: &Selector, action: &Action) -> ProbeResult<()> {
        let value = self
            .evaluate(script::action_expression(selector, action)?)
            .await?;
        script::decode_action(selector, value)
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| ProbeError::driver(format!("screenshot: {e}")))?;

        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| ProbeError::driver(format!("screenshot: {e}")))
    }

    async fn close(&self) -> ProbeResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(e) = self.page.clone().close().await {
            debug!(error = %e, "page already gone");
        }
        let browser = self.browser.lock().await;
        browser
            .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
            .await
            .map_err(|e| ProbeError::driver(format!("dispose browser context: {e}")))?;
        Ok(())
    }
}
