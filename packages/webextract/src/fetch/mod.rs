//! Fetcher implementations for retrieving page content.
//!
//! Two modes are provided:
//! - [`HttpFetcher`] - a single HTTP GET; fast, static HTML only.
//! - [`BrowserFetcher`] - full headless-browser render for sites that
//!   build their content with JavaScript; slower, spins a browser per call.
//!
//! Both respect a hard timeout and surface every failure as a typed
//! [`FetchError`](crate::error::FetchError).

use async_trait::async_trait;

use crate::error::FetchResult;

mod browser;
mod http;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

/// Fixed browser-like User-Agent sent by both fetch modes.
///
/// Many sites serve degraded or blocked responses to obvious bot agents.
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetcher trait: retrieve one page's markup.
///
/// Implementations own their timeout; exceeding it fails the call rather
/// than hanging the pipeline.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the raw markup for a URL.
    async fn fetch(&self, url: &str) -> FetchResult<String>;

    /// Fetcher name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
