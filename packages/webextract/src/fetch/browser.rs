//! Headless-browser fetcher for JavaScript-rendered pages.
//!
//! Each call launches an isolated browser, navigates, waits for the page to
//! settle, captures the rendered DOM, and tears the browser down on every
//! exit path. There is no pooling across calls: a leaked browser process is
//! worse than a slow fetch, so the lifetime is strictly scope-bound.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::fetch::{Fetcher, USER_AGENT};

/// Fixed delay after navigation settles, letting lazy-loaded content land.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Fetches the fully rendered DOM via a headless Chromium instance.
pub struct BrowserFetcher {
    timeout: Duration,
}

impl BrowserFetcher {
    /// Create a fetcher with the given hard timeout per fetch.
    ///
    /// The timeout bounds the whole navigate-and-capture sequence; browser
    /// teardown runs after it regardless of outcome.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn navigate_and_capture(&self, browser: &Browser, url: &str) -> FetchResult<String> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(Box::new(e)))?;

        let result = async {
            page.set_user_agent(USER_AGENT)
                .await
                .map_err(|e| FetchError::Browser(Box::new(e)))?;

            page.goto(url)
                .await
                .map_err(|e| FetchError::Browser(Box::new(e)))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| FetchError::Browser(Box::new(e)))?;

            // Give deferred scripts a moment to fill in content.
            tokio::time::sleep(SETTLE_DELAY).await;

            page.content()
                .await
                .map_err(|e| FetchError::Browser(Box::new(e)))
        }
        .await;

        // Close the page on success and failure alike.
        if let Err(e) = page.close().await {
            warn!(url = %url, error = %e, "failed to close browser page");
        }

        result
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        debug!(url = %url, "browser fetch starting");

        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| FetchError::Browser(e.into()))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(Box::new(e)))?;

        // The handler stream must be driven for the CDP connection to work.
        let handler_task: JoinHandle<()> = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let outcome = tokio::time::timeout(self.timeout, self.navigate_and_capture(&browser, url))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout {
                    url: url.to_string(),
                })
            });

        // Unconditional teardown: close the browser process and stop the
        // handler task whether the fetch succeeded, failed, or timed out.
        if let Err(e) = browser.close().await {
            warn!(url = %url, error = %e, "failed to close browser");
        }
        if let Err(e) = browser.wait().await {
            warn!(url = %url, error = %e, "browser did not exit cleanly");
        }
        handler_task.abort();

        if let Ok(html) = &outcome {
            debug!(url = %url, bytes = html.len(), "browser fetch complete");
        }
        outcome
    }

    fn name(&self) -> &str {
        "browser"
    }
}
