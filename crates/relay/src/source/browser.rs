//! Headless-browser profile fetcher.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;

use crate::config::RelayConfig;
use crate::error::RelayError;

use super::parser::PostParser;
use super::types::Post;
use super::PostSource;

/// Time given to client-side rendering after navigation completes.
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Settings for [`BrowserSource`].
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Site root; profiles live at `{base_url}/{account}`.
    pub base_url: String,
    /// User agent presented by the browser.
    pub user_agent: String,
    /// Navigation timeout.
    pub navigation_timeout: Duration,
    /// Pause after navigation before reading the DOM.
    pub settle_delay: Duration,
}

impl BrowserSettings {
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            navigation_timeout: config.navigation_timeout,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Renders the profile page in headless Chromium and scrapes its posts.
pub struct BrowserSource {
    settings: BrowserSettings,
}

impl BrowserSource {
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RelayError> {
        BrowserConfig::builder()
            .arg("--no-sandbox") // Required for containerized environments
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage") // Avoid /dev/shm size issues in containers
            .arg(format!("--user-agent={}", self.settings.user_agent))
            .request_timeout(self.settings.navigation_timeout)
            .build()
            .map_err(|e| RelayError::Browser(format!("Failed to build browser config: {e}")))
    }

    /// Load the page and return its HTML together with the origin it ended up on.
    ///
    /// `None` means the site redirected to a login wall.
    async fn load_page(
        &self,
        browser: &Browser,
        url: &str,
    ) -> Result<Option<(String, String)>, RelayError> {
        let navigation_error = |reason: String| RelayError::Navigation {
            url: url.to_string(),
            reason,
        };

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(RelayError::browser)?;

        tracing::debug!(url, "Navigating to profile page");
        tokio::time::timeout(self.settings.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| {
                navigation_error(format!(
                    "timed out after {}s",
                    self.settings.navigation_timeout.as_secs()
                ))
            })?
            .map_err(|e| navigation_error(e.to_string()))?;

        // The profile timeline is rendered client-side after the load event.
        tokio::time::sleep(self.settings.settle_delay).await;

        let final_url = page
            .url()
            .await
            .map_err(RelayError::browser)?
            .unwrap_or_else(|| url.to_string());
        if final_url.contains("login") || final_url.contains("/i/flow") {
            tracing::warn!(url = %final_url, "Redirected to login - profile is not publicly visible");
            return Ok(None);
        }

        let html = page.content().await.map_err(RelayError::browser)?;
        tracing::debug!(len = html.len(), "Got page content");
        dump_html(&html);

        let origin = reqwest::Url::parse(&final_url)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|_| self.settings.base_url.clone());

        Ok(Some((html, origin)))
    }
}

#[async_trait]
impl PostSource for BrowserSource {
    async fn fetch(&self, account: &str) -> Result<Vec<Post>, RelayError> {
        let url = format!("{}/{account}", self.settings.base_url);
        tracing::info!(url = %url, "Loading profile page");

        let (mut browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| RelayError::Browser(format!("Failed to launch browser: {e}")))?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let loaded = self.load_page(&browser, &url).await;

        // Release the browser whatever happened on the page.
        match browser.close().await {
            Ok(_) => {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "Browser handler task failed");
                }
            }
            Err(e) => {
                // The handler may never see the connection end; stop it here.
                tracing::warn!(error = %e, "Failed to close browser");
                handle.abort();
            }
        }

        Ok(match loaded? {
            Some((html, origin)) => PostParser::parse(&html, &origin),
            None => Vec::new(),
        })
    }
}

/// Write the fetched HTML to disk when `RELAY_DUMP_HTML` is set.
fn dump_html(html: &str) {
    if std::env::var("RELAY_DUMP_HTML").is_err() {
        return;
    }
    let dump_path =
        std::env::var("RELAY_DUMP_PATH").unwrap_or_else(|_| "/tmp/post-relay.html".to_string());
    if let Err(e) = std::fs::write(&dump_path, html) {
        tracing::warn!(path = %dump_path, error = %e, "Failed to dump HTML");
    } else {
        tracing::info!(path = %dump_path, "Dumped HTML for inspection");
    }
}
