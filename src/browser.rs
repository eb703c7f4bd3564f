use ::rand::seq::SliceRandom;
use ::std::time::Duration;
use ::thirtyfour::prelude::*;

use crate::constants::*;
use crate::imports::*;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The capability the extractor needs from a browser automation backend.
#[allow(async_fn_in_trait)]
pub trait Browser: Sized + Send {
    async fn navigate(&self, url: &str) -> Result<()>;

    /// `Ok(false)` means the timeout expired without an element matching `css`.
    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<bool>;

    async fn page_html(&self) -> Result<String>;

    async fn close(self) -> Result<()>;
}

#[allow(async_fn_in_trait)]
pub trait BrowserProvider: Send + Sync {
    type Session: Browser;

    async fn acquire(&self) -> Result<Self::Session>;
}

pub struct WebDriverProvider {
    server_url: String,
}

impl WebDriverProvider {
    pub fn new(server_url: &str) -> WebDriverProvider {
        WebDriverProvider { server_url: server_url.to_string() }
    }
}

impl BrowserProvider for WebDriverProvider {
    type Session = WebDriverSession;

    async fn acquire(&self) -> Result<WebDriverSession> {
        let user_agent = USER_AGENTS.choose(&mut rand::thread_rng()).expect("user agent pool is non-empty");
        let mut caps = DesiredCapabilities::chrome();
        for arg in [
            "--headless",
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-extensions",
            "--disable-blink-features=AutomationControlled",
        ] {
            caps.add_chrome_arg(arg).context("Failed to set Chrome argument")?;
        }
        caps.add_chrome_arg(&format!("--user-agent={}", user_agent)).context("Failed to set user agent")?;
        let driver = WebDriver::new(&self.server_url, caps)
            .await
            .with_context(|| format!("Failed to start WebDriver session at {:?}", self.server_url))?;
        debug!("Started WebDriver session at {:?}", self.server_url);
        Ok(WebDriverSession { driver })
    }
}

pub struct WebDriverSession {
    driver: WebDriver,
}

impl Browser for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.driver.goto(url).await.with_context(|| format!("Failed to navigate to {:?}", url))
    }

    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<bool> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.driver.find_all(By::Css(css)).await {
                Ok(elements) if !elements.is_empty() => return Ok(true),
                _ => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn page_html(&self) -> Result<String> {
        self.driver.source().await.context("Failed to read rendered page source")
    }

    async fn close(self) -> Result<()> {
        self.driver.quit().await.context("Failed to quit WebDriver session")
    }
}
