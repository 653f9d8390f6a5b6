//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction
//! library without making real model or network calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult, ModelResult};
use crate::fetch::Fetcher;
use crate::model::ModelClient;

/// A mock fetcher serving predefined pages.
///
/// Unknown URLs answer like a 404 so failure paths are exercised without
/// a network. An optional delay and an in-flight gauge make concurrency
/// behavior observable in tests.
///
/// Clones share state, so a clone handed to an extractor can still be
/// inspected from the test afterward.
#[derive(Default, Clone)]
pub struct MockFetcher {
    /// Predefined page markup by URL
    pages: Arc<RwLock<HashMap<String, String>>>,

    /// URLs that should fail with a connection error
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// Artificial per-fetch delay
    delay: Option<Duration>,

    /// Currently in-flight fetches
    in_flight: Arc<AtomicUsize>,

    /// High-water mark of simultaneous fetches
    max_in_flight: Arc<AtomicUsize>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create a new mock fetcher with no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined page.
    pub fn with_page(self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), markup.into());
        self
    }

    /// Mark a URL as failing with a connection error.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    /// Delay every fetch, so overlapping fetches actually overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Highest number of fetches that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        self.calls.write().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_urls.read().unwrap().contains(&url.to_string()) {
            return Err(FetchError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock connection refused",
            ))));
        }

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock model client returning canned replies.
///
/// Replies can be keyed by a substring of the prompt; a default reply
/// covers everything else. Clones share state, like [`MockFetcher`].
#[derive(Default, Clone)]
pub struct MockModel {
    /// Replies keyed by a prompt substring, checked in insertion order
    keyed_replies: Arc<RwLock<Vec<(String, String)>>>,

    /// Reply when no key matches
    default_reply: Arc<RwLock<Option<String>>>,

    /// Prompts received, in call order
    prompts: Arc<RwLock<Vec<String>>>,
}

impl MockModel {
    /// Create a new mock model with no replies configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        *self.default_reply.write().unwrap() = Some(reply.into());
        self
    }

    /// Reply with `reply` whenever the prompt contains `needle`.
    pub fn with_reply_for(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.keyed_replies
            .write()
            .unwrap()
            .push((needle.into(), reply.into()));
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.read().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn complete(&self, prompt: &str) -> ModelResult<String> {
        self.prompts.write().unwrap().push(prompt.to_string());

        for (needle, reply) in self.keyed_replies.read().unwrap().iter() {
            if prompt.contains(needle.as_str()) {
                return Ok(reply.clone());
            }
        }

        Ok(self
            .default_reply
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "{}".to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_serves_pages() {
        let fetcher = MockFetcher::new()
            .with_page("https://example.com/a", "<p>A</p>")
            .with_page("https://example.com/b", "<p>B</p>");

        let markup = fetcher.fetch("https://example.com/a").await.unwrap();
        assert_eq!(markup, "<p>A</p>");

        let err = fetcher.fetch("https://example.com/missing").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));

        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_fetcher_fail_url() {
        let fetcher = MockFetcher::new()
            .with_page("https://fail.test", "<p>never served</p>")
            .fail_url("https://fail.test");

        let err = fetcher.fetch("https://fail.test").await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }

    #[tokio::test]
    async fn test_mock_model_keyed_replies() {
        let model = MockModel::new()
            .with_reply_for("widget", r#"{"title": "Widget"}"#)
            .with_reply("{}");

        let reply = model.complete("extract the widget page").await.unwrap();
        assert_eq!(reply, r#"{"title": "Widget"}"#);

        let reply = model.complete("something else").await.unwrap();
        assert_eq!(reply, "{}");

        assert_eq!(model.prompts().len(), 2);
    }
}
