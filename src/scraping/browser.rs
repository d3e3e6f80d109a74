//! Browser session seam.
//!
//! The scraper only talks to [`BrowserPage`]; the WebDriver implementation
//! drives a real Chrome, tests plug in canned pages.

use async_trait::async_trait;
use serde_json::json;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;

use crate::error::{AppError, Result};
use crate::scraping::stealth::{IMAGES_CONTENT_SETTING, StealthProfile};

/// One open browser tab.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn title(&self) -> Result<String>;

    /// Current document HTML.
    async fn content(&self) -> Result<String>;

    /// Release the session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Open a session with `profile` applied before the first navigation.
    async fn launch(&self, profile: &StealthProfile) -> Result<Box<dyn BrowserPage>>;
}

/// Owns one open page until it is closed.
///
/// [`close`](Self::close) releases the page in place. A session dropped while
/// still open, for example because the future holding it was cancelled, hands
/// its page to a background task that closes it.
pub struct BrowserSession {
    page: Option<Box<dyn BrowserPage>>,
}

impl BrowserSession {
    pub fn new(page: Box<dyn BrowserPage>) -> Self {
        Self { page: Some(page) }
    }

    pub fn page(&self) -> Result<&dyn BrowserPage> {
        self.page
            .as_deref()
            .ok_or_else(|| AppError::Browser("session already closed".to_string()))
    }

    pub async fn close(mut self) -> Result<()> {
        match self.page.take() {
            Some(mut page) => page.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let Some(mut page) = self.page.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("Closing abandoned browser session in the background");
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::warn!("Failed to close abandoned browser session: {e}");
                    }
                });
            }
            Err(_) => tracing::warn!("No runtime left to close an abandoned browser session"),
        }
    }
}

/// Launches headless Chrome sessions through a WebDriver endpoint.
pub struct WebDriverLauncher {
    webdriver_url: String,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self, profile: &StealthProfile) -> Result<Box<dyn BrowserPage>> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option(
            "args",
            vec![
                "--headless=new".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
                "--window-size=1920,1080".to_string(),
                "--disable-blink-features=AutomationControlled".to_string(),
                format!("--user-agent={}", profile.user_agent),
                format!("--lang={}", profile.accept_language),
            ],
        )?;
        let mut prefs = serde_json::Map::new();
        prefs.insert(IMAGES_CONTENT_SETTING.to_string(), json!(2));
        caps.add_chrome_option("prefs", prefs)?;

        let driver = WebDriver::new(&self.webdriver_url, caps)
            .await
            .map_err(|e| AppError::Browser(format!("Failed to connect to WebDriver: {e}")))?;

        let mut page = WebDriverPage {
            driver: Some(driver),
        };
        if let Err(e) = page.apply_stealth(profile).await {
            page.close().await.ok();
            return Err(e);
        }
        Ok(Box::new(page))
    }
}

pub struct WebDriverPage {
    driver: Option<WebDriver>,
}

impl WebDriverPage {
    fn driver(&self) -> Result<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| AppError::Browser("session already closed".to_string()))
    }

    /// Install the pre-page script, headers, user agent and URL blocking over CDP.
    async fn apply_stealth(&self, profile: &StealthProfile) -> Result<()> {
        let dev_tools = ChromeDevTools::new(self.driver()?.handle.clone());

        dev_tools
            .execute_cdp_with_params(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": profile.init_script }),
            )
            .await?;
        dev_tools.execute_cdp("Network.enable").await?;
        dev_tools
            .execute_cdp_with_params(
                "Network.setUserAgentOverride",
                json!({
                    "userAgent": profile.user_agent,
                    "acceptLanguage": profile.accept_language,
                }),
            )
            .await?;
        dev_tools
            .execute_cdp_with_params(
                "Network.setExtraHTTPHeaders",
                json!({
                    "headers": {
                        "Accept-Language": profile.accept_language,
                        "Accept-Encoding": profile.accept_encoding,
                    }
                }),
            )
            .await?;
        dev_tools
            .execute_cdp_with_params(
                "Network.setBlockedURLs",
                json!({ "urls": profile.blocked_url_patterns }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserPage for WebDriverPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.driver()?.goto(url).await?;
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.driver()?.title().await?)
    }

    async fn content(&self) -> Result<String> {
        Ok(self.driver()?.source().await?)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
        }
        Ok(())
    }
}
