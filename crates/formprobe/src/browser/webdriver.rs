//! Gecko and WebKit over WebDriver.
//!
//! The engine is an already running WebDriver server (geckodriver or
//! WebKitWebDriver). Every context is a new session, which gives each
//! attempt its own browser profile.

use super::{webdriver_body, BrowserEngine};
use crate::config::{Engine, SuiteConfig};
use crate::driver::{Action, Driver, ElementState};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::script;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Session capabilities for a WebDriver-backed profile.
///
/// Chromium is driven over CDP and has no WebDriver profile.
pub fn capabilities(engine: Engine, config: &SuiteConfig) -> ProbeResult<Map<String, Value>> {
    let mut caps = Map::new();
    match engine {
        Engine::Webkit => {
            let mut args = vec![json!("--automation")];
            if config.headless {
                args.push(json!("--headless"));
            }
            let mut options = json!({ "args": args });
            if let Some(binary) = &config.webkit_binary {
                options["binary"] = json!(binary.display().to_string());
            }
            caps.insert("browserName".to_string(), json!("MiniBrowser"));
            caps.insert("webkitgtk:browserOptions".to_string(), options);
        }
        Engine::Gecko => {
            let args: Vec<Value> = if config.headless {
                vec![json!("-headless")]
            } else {
                Vec::new()
            };
            caps.insert("browserName".to_string(), json!("firefox"));
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
        Engine::Chromium => return Err(not_webdriver(engine)),
    }
    Ok(caps)
}

fn not_webdriver(engine: Engine) -> ProbeError {
    ProbeError::config(format!("{engine} is not driven over WebDriver"))
}

/// A WebDriver server for one profile
#[derive(Debug)]
pub struct WebDriverEngine {
    engine: Engine,
    endpoint: String,
    capabilities: Map<String, Value>,
    viewport: (u32, u32),
}

impl WebDriverEngine {
    /// Connect to the profile's WebDriver server and check it opens sessions
    pub async fn connect(engine: Engine, config: &SuiteConfig) -> ProbeResult<Self> {
        let endpoint = match engine {
            Engine::Webkit => config.webkit_webdriver.clone(),
            Engine::Gecko => config.gecko_webdriver.clone(),
            Engine::Chromium => return Err(not_webdriver(engine)),
        };
        let this = Self {
            engine,
            endpoint,
            capabilities: capabilities(engine, config)?,
            viewport: (config.viewport_width, config.viewport_height),
        };

        let probe = this.session().await?;
        if let Err(e) = probe.close().await {
            warn!(engine = %engine, error = %e, "probe session did not close");
        }
        info!(engine = %engine, endpoint = %this.endpoint, "webdriver ready");
        Ok(this)
    }

    async fn session(&self) -> ProbeResult<Client> {
        ClientBuilder::native()
            .capabilities(self.capabilities.clone())
            .connect(&self.endpoint)
            .await
            .map_err(|e| ProbeError::BrowserLaunchError {
                engine: self.engine.to_string(),
                message: format!("{}: {e}", self.endpoint),
            })
    }
}

#[async_trait]
impl BrowserEngine for WebDriverEngine {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn new_context(&self) -> ProbeResult<Arc<dyn Driver>> {
        let client = self.session().await?;
        let (width, height) = self.viewport;
        if let Err(e) = client.set_window_size(width, height).await {
            debug!(engine = %self.engine, error = %e, "window size not applied");
        }
        Ok(Arc::new(WebDriverContext {
            client,
            closed: AtomicBool::new(false),
        }))
    }

    async fn shutdown(&self) -> ProbeResult<()> {
        // Sessions are closed with their contexts; the server outlives the suite
        Ok(())
    }
}

/// One WebDriver session
#[derive(Debug)]
pub struct WebDriverContext {
    client: Client,
    closed: AtomicBool,
}

impl WebDriverContext {
    async fn execute(&self, expression: &str) -> ProbeResult<Value> {
        self.client
            .execute(&webdriver_body(expression), Vec::new())
            .await
            .map_err(|e| ProbeError::script(e.to_string()))
    }
}

#[async_trait]
impl Driver for WebDriverContext {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| ProbeError::navigation(url, e.to_string()))
    }

    async fn current_url(&self) -> ProbeResult<String> {
        let url = self
            .client
            .current_url()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?;
        Ok(url.to_string())
    }

    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementState>> {
        let value = self.execute(&script::query_expression(selector)?).await?;
        script::decode_query(value)
    }

    async fn perform(&self, selector: &Selector, action: &Action) -> ProbeResult<()> {
        let value = self
            .execute(&script::action_expression(selector, action)?)
            .await?;
        script::decode_action(selector, value)
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        self.client
            .screenshot()
            .await
            .map_err(|e| ProbeError::driver(format!("screenshot: {e}")))
    }

    async fn close(&self) -> ProbeResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| ProbeError::driver(format!("end session: {e}")))
    }
}
