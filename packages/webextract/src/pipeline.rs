//! Extraction pipeline orchestrator.
//!
//! Composes fetch → reduce → prompt → model call → recovery into a
//! per-URL pipeline, runs many pipelines under a concurrency cap, and
//! normalizes every outcome — success or failure — into a uniform record.
//!
//! The orchestrator is the only component aware of the batch. Per-URL
//! errors are caught at the single-URL boundary and become failure
//! outcomes; they never abort sibling URLs.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::PipelineResult;
use crate::fetch::Fetcher;
use crate::model::ModelClient;
use crate::outcome::{BatchResult, Outcome, Record};
use crate::prompt::build_extraction_prompt;
use crate::recover::recover_json;
use crate::reduce::Reducer;
use crate::schema::Schema;

/// Default number of concurrently in-flight single-URL pipelines.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Batch scheduling configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Maximum simultaneously in-flight single-URL pipelines.
    pub concurrency: usize,

    /// Run URLs one at a time, preserving the same per-item isolation.
    /// Useful for debugging and deterministic runs.
    pub sequential: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            sequential: false,
        }
    }
}

/// The extraction orchestrator.
///
/// Holds the fetcher, model client and reducer shared by all pipelines in
/// a batch. No other state is shared between concurrent pipelines.
pub struct Extractor<F: Fetcher, M: ModelClient> {
    fetcher: F,
    model: M,
    reducer: Reducer,
    config: ExtractorConfig,
}

impl<F: Fetcher, M: ModelClient> Extractor<F, M> {
    /// Create an extractor with default batch configuration.
    pub fn new(fetcher: F, model: M) -> Self {
        Self {
            fetcher,
            model,
            reducer: Reducer::new(),
            config: ExtractorConfig::default(),
        }
    }

    /// Set the concurrency cap. A cap of zero is clamped to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Switch to sequential mode.
    pub fn sequential(mut self) -> Self {
        self.config.sequential = true;
        self
    }

    /// Replace the reducer configuration.
    pub fn with_reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    /// Extract structured records from a batch of URLs.
    ///
    /// Always returns exactly one outcome per input URL, in input order,
    /// regardless of completion order or per-URL failures.
    pub async fn extract_batch(&self, urls: &[String], schema: &Schema) -> BatchResult {
        info!(
            urls = urls.len(),
            fields = schema.len(),
            concurrency = self.config.concurrency,
            sequential = self.config.sequential,
            "starting extraction batch"
        );

        let outcomes = if self.config.sequential {
            let mut outcomes = Vec::with_capacity(urls.len());
            for url in urls {
                outcomes.push(self.extract_one(url, schema).await);
            }
            outcomes
        } else {
            // Admission gate: no pipeline starts its fetch until it holds a
            // slot; the slot is released when the pipeline ends either way.
            // join_all returns results in input order no matter which
            // pipeline finishes first.
            let gate = Arc::new(Semaphore::new(self.config.concurrency));
            let futures = urls.iter().map(|url| {
                let gate = Arc::clone(&gate);
                async move {
                    let _permit = gate
                        .acquire()
                        .await
                        .expect("admission gate is never closed");
                    self.extract_one(url, schema).await
                }
            });
            join_all(futures).await
        };

        info!(
            successes = outcomes.iter().filter(|o| o.is_success()).count(),
            failures = outcomes.iter().filter(|o| o.is_failure()).count(),
            "extraction batch complete"
        );

        BatchResult::new(outcomes)
    }

    /// Run the single-URL pipeline, converting any stage failure into a
    /// failure outcome at this boundary.
    pub async fn extract_one(&self, url: &str, schema: &Schema) -> Outcome {
        match self.run_pipeline(url, schema).await {
            Ok(record) => Outcome::Success(record),
            Err(e) => {
                warn!(url = %url, error = %e, "extraction failed");
                Outcome::failure(url, e)
            }
        }
    }

    /// fetch → reduce → prompt → complete → recover → merge provenance.
    async fn run_pipeline(&self, url: &str, schema: &Schema) -> PipelineResult<Record> {
        let markup = self.fetcher.fetch(url).await?;
        let text = self.reducer.reduce(&markup);
        debug!(url = %url, chars = text.chars().count(), "page reduced");

        let prompt = build_extraction_prompt(schema, &text);
        let reply = self.model.complete(&prompt).await?;
        let fields = recover_json(&reply)?;

        Ok(Record::new(url, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFetcher, MockModel};

    fn widget_schema() -> Schema {
        Schema::from_json(r#"{"title": "string", "price": "number"}"#).unwrap()
    }

    #[tokio::test]
    async fn test_single_url_success() {
        let fetcher = MockFetcher::new()
            .with_page("https://shop.test/widget", "<h1>Title: Widget</h1><p>Price: $19.99</p>");
        let model = MockModel::new().with_reply(r#"{"title": "Widget", "price": 19.99}"#);
        let extractor = Extractor::new(fetcher, model);

        let outcome = extractor
            .extract_one("https://shop.test/widget", &widget_schema())
            .await;

        let Outcome::Success(record) = outcome else {
            panic!("expected success");
        };
        assert_eq!(record.url(), "https://shop.test/widget");
        assert_eq!(record.get("price"), Some(&serde_json::json!(19.99)));
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_failure_outcome() {
        let fetcher = MockFetcher::new(); // knows no pages -> every fetch 404s
        let model = MockModel::new().with_reply("{}");
        let extractor = Extractor::new(fetcher, model);

        let outcome = extractor
            .extract_one("https://missing.test", &widget_schema())
            .await;

        assert!(outcome.is_failure());
        assert_eq!(outcome.url(), "https://missing.test");
    }

    #[tokio::test]
    async fn test_unparseable_reply_becomes_failure_outcome() {
        let fetcher = MockFetcher::new().with_page("https://shop.test", "<p>content</p>");
        let model = MockModel::new().with_reply("no JSON here at all");
        let extractor = Extractor::new(fetcher, model);

        let outcome = extractor.extract_one("https://shop.test", &widget_schema()).await;

        let Outcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert!(failure.error.contains("could not parse"));
    }

    #[tokio::test]
    async fn test_sequential_mode_preserves_isolation() {
        let fetcher = MockFetcher::new().with_page("https://a.test", "<p>A</p>");
        let model = MockModel::new().with_reply(r#"{"title": "A", "price": 1}"#);
        let extractor = Extractor::new(fetcher, model).sequential();

        let urls = vec!["https://a.test".to_string(), "https://b.test".to_string()];
        let batch = extractor.extract_batch(&urls, &widget_schema()).await;

        assert_eq!(batch.len(), 2);
        assert!(batch.iter().next().unwrap().is_success());
        assert!(batch.iter().nth(1).unwrap().is_failure());
    }
}
