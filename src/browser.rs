//! WebDriver session wrapper.
//!
//! One `Browser` is one isolated session: its own temp profile directory,
//! a realistic user agent and viewport, and anti-automation flags. The
//! search orchestrator acquires one per search and always releases it.

use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder, Locator, elements::Element};
use rand::seq::SliceRandom;
use serde_json::json;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info};

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = anyhow::Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

/// Rotated to avoid presenting a single fleet-wide identity
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
];

const VIEWPORT_WIDTH: u32 = 1920;
const VIEWPORT_HEIGHT: u32 = 1080;

/// Browser instance for WebDriver automation
pub struct Browser {
    pub(crate) client: Client,
    // Held so the isolated profile directory outlives the session
    _profile_dir: TempDir,
}

impl Browser {
    /// Connect a fresh session with an isolated profile and realistic
    /// identity.
    pub async fn new(webdriver_url: &str, browser_type: BrowserType, headless: bool) -> Result<Self> {
        info!("Connecting to {:?} WebDriver at {}", browser_type, webdriver_url);

        let profile_dir = tempfile::Builder::new()
            .prefix("lensprobe-")
            .tempdir()
            .context("Failed to create profile directory")?;

        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let mut caps = serde_json::Map::new();

        match browser_type {
            BrowserType::Firefox => {
                let mut args = vec![
                    format!("--width={}", VIEWPORT_WIDTH),
                    format!("--height={}", VIEWPORT_HEIGHT),
                ];
                if headless {
                    args.push("--headless".to_string());
                }
                caps.insert(
                    "moz:firefoxOptions".to_string(),
                    json!({
                        "args": args,
                        "prefs": { "general.useragent.override": user_agent }
                    }),
                );
            }
            BrowserType::Chrome => {
                let mut args = vec![
                    "--no-sandbox".to_string(),
                    "--disable-dev-shm-usage".to_string(),
                    "--disable-blink-features=AutomationControlled".to_string(),
                    "--disable-extensions".to_string(),
                    "--disable-notifications".to_string(),
                    "--disable-popup-blocking".to_string(),
                    "--disable-infobars".to_string(),
                    "--no-first-run".to_string(),
                    "--no-default-browser-check".to_string(),
                    "--lang=en".to_string(),
                    format!("--user-agent={}", user_agent),
                    format!("--window-size={},{}", VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
                    format!("--user-data-dir={}", profile_dir.path().display()),
                ];
                if headless {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                }
                caps.insert(
                    "goog:chromeOptions".to_string(),
                    json!({
                        "args": args,
                        "excludeSwitches": ["enable-automation"]
                    }),
                );
            }
        }

        debug!("Connecting with user agent: {}", user_agent);

        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .context("Failed to connect to WebDriver")?;

        if let Err(e) = client.set_window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT).await {
            debug!("Could not set window size: {}", e);
        }

        Ok(Browser {
            client,
            _profile_dir: profile_dir,
        })
    }

    /// Navigate and wait for the document to settle
    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.client.goto(url).await?;

        // Poll readiness instead of trusting the navigation future alone
        let wait_script = "return document.readyState === 'complete';";
        for _ in 0..30 {
            match self.client.execute(wait_script, vec![]).await {
                Ok(val) if val.as_bool().unwrap_or(false) => break,
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        Ok(())
    }

    /// Current page markup
    pub async fn page_source(&self) -> Result<String> {
        self.client.source().await.context("Failed to read page source")
    }

    /// Markup, reduced to the empty string on failure. Fingerprinting and
    /// heuristics prefer a degraded answer over a fault.
    pub async fn page_source_or_empty(&self) -> String {
        self.page_source().await.unwrap_or_default()
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    /// Execute JavaScript in the page
    pub async fn execute(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        self.client
            .execute(script, args)
            .await
            .context("Failed to execute script")
    }

    /// Find an element and wait until it is displayed, up to `timeout`
    pub async fn find_visible(&self, locator: Locator<'_>, timeout: Duration) -> Result<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = self.client.find(locator).await
                && element.is_displayed().await.unwrap_or(false)
            {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                anyhow::bail!("Element not visible within {:?}: {:?}", timeout, locator);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Whether any element matching the locator is currently present
    pub async fn exists(&self, locator: Locator<'_>) -> bool {
        matches!(self.client.find_all(locator).await, Ok(found) if !found.is_empty())
    }

    /// Release the session. The WebDriver ends the browser process; the
    /// profile directory is removed on drop.
    pub async fn close(self) -> Result<()> {
        self.client.close().await.context("Failed to close browser session")?;
        info!("Browser session closed");
        Ok(())
    }
}
