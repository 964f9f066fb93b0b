use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{EstuaryError, Result};
use crate::scraper::config::ScraperConfig;
use crate::scraper::driver::{scripts, PageDriver};
use crate::scraper::{RenderedPage, Renderer};

const LISTING_POLL: Duration = Duration::from_millis(250);

fn browser_err(context: &str) -> impl FnOnce(chromiumoxide::error::CdpError) -> EstuaryError + '_ {
    move |e| EstuaryError::Browser(format!("{}: {}", context, e))
}

/// Launches a dedicated headless Chrome per render.
pub struct ChromeRenderer {
    config: ScraperConfig,
}

impl ChromeRenderer {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Emulated viewport. Must match the window size; chromiumoxide
    /// otherwise emulates 800x600.
    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.config.window_width,
            height: self.config.window_height,
            ..Viewport::default()
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.config.window_width, self.config.window_height)
            .viewport(self.viewport())
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars");

        if !self.config.headless {
            builder = builder.with_head();
        }

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg.clone());
        }

        builder
            .build()
            .map_err(|e| EstuaryError::Browser(format!("Failed to build browser config: {}", e)))
    }

    async fn launch(&self) -> Result<ChromeSession> {
        info!("Launching browser (headless={})", self.config.headless);

        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| {
                EstuaryError::Browser(format!(
                    "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                    e
                ))
            })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(browser_err("Failed to create page"));

        let mut session = ChromeSession {
            browser: Some(browser),
            handler_task: Some(handler_task),
            page: None,
        };

        match page {
            Ok(page) => {
                session.page = Some(page);
                Ok(session)
            }
            Err(e) => {
                session.release().await;
                Err(e)
            }
        }
    }

    async fn navigate(&self, session: &ChromeSession, url: &str) -> Result<()> {
        let page = session.page()?;

        page.set_user_agent(&self.config.user_agent)
            .await
            .map_err(browser_err("Failed to set user agent"))?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            scripts::HIDE_WEBDRIVER,
        ))
        .await
        .map_err(browser_err("Failed to install stealth script"))?;

        info!("Requesting page: {}", url);
        page.goto(url)
            .await
            .map_err(browser_err("Navigation failed"))?;

        info!("Waiting for initial product items to be visible...");
        let wait = self.config.initial_wait();
        let appeared = tokio::time::timeout(wait, async {
            loop {
                match session.count(&self.config.listing_selector).await {
                    Ok(n) if n > 0 => return n,
                    Ok(_) => {}
                    Err(e) => debug!("Listing count failed: {}", e),
                }
                tokio::time::sleep(LISTING_POLL).await;
            }
        })
        .await;

        match appeared {
            Ok(n) => {
                info!("{} listings present", n);
                tokio::time::sleep(self.config.post_load_pause()).await;
                Ok(())
            }
            Err(_) => Err(EstuaryError::RenderTimeout(wait)),
        }
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    type Page = ChromeSession;

    async fn render(&self, url: &str) -> Result<ChromeSession> {
        let mut session = self.launch().await?;

        if let Err(e) = self.navigate(&session, url).await {
            session.release().await;
            return Err(e);
        }

        Ok(session)
    }
}

/// A running browser with one page open.
///
/// [`release`](RenderedPage::release) closes the browser and reaps the
/// process. Dropping an unreleased session still kills the process, since
/// chromiumoxide kills its child when the `Browser` is dropped.
pub struct ChromeSession {
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
    page: Option<Page>,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| EstuaryError::Browser("browser session already released".into()))
    }
}

#[async_trait]
impl PageDriver for ChromeSession {
    async fn execute_script(&self, script: &str) -> Result<Value> {
        let result = self
            .page()?
            .evaluate(script.to_string())
            .await
            .map_err(browser_err("Script execution failed"))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn current_html(&self) -> Result<String> {
        self.page()?
            .content()
            .await
            .map_err(browser_err("Failed to read page source"))
    }

    async fn hover(&self, selector: &str, index: usize) -> Result<()> {
        let elements = self
            .page()?
            .find_elements(selector)
            .await
            .map_err(browser_err("Element lookup failed"))?;
        let element = elements.get(index).ok_or_else(|| {
            EstuaryError::step("hover", format!("no element {} for {}", index, selector))
        })?;
        element
            .hover()
            .await
            .map_err(browser_err("Hover failed"))?;
        Ok(())
    }
}

#[async_trait]
impl RenderedPage for ChromeSession {
    async fn release(&mut self) {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser close failed: {}", e);
            }
            match browser.wait().await {
                Ok(_) => debug!("Browser process exited"),
                Err(e) => warn!("Failed to reap browser process: {}", e),
            }
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        debug!("Browser released");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        if self.browser.is_some() {
            warn!("Browser session dropped without release; killing process");
        }
    }
}
