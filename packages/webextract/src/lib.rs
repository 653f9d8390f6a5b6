//! Schema-Driven Web Extraction Library
//!
//! Turns web pages into structured records: fetch a page, reduce it to
//! text the model can read, ask the model to fill a user-defined schema,
//! and recover structured JSON from whatever the model replies.
//!
//! # Design Philosophy
//!
//! - Schema-driven: the caller says what fields to extract, not how
//! - Failure-isolated: one bad page never sinks the rest of the batch
//! - Order-preserving: results come back in input order, always one per URL
//! - Model replies are untrusted: a recovery parser salvages imperfect JSON
//!
//! # Usage
//!
//! ```rust,ignore
//! use webextract::{AnthropicClient, Extractor, HttpFetcher, Schema};
//! use std::time::Duration;
//!
//! let schema = Schema::from_json(r#"{"title": "string", "price": "number"}"#)?;
//! let fetcher = HttpFetcher::new(Duration::from_secs(30))?;
//! let model = AnthropicClient::from_env()?;
//!
//! let extractor = Extractor::new(fetcher, model).with_concurrency(5);
//! let results = extractor.extract_batch(&urls, &schema).await;
//! ```
//!
//! # Modules
//!
//! - [`fetch`] - Page retrieval (plain HTTP and headless browser)
//! - [`reduce`] - HTML to capped markdown text
//! - [`prompt`] - Deterministic extraction prompt construction
//! - [`model`] - LLM client abstraction and the Anthropic implementation
//! - [`recover`] - Multi-stage JSON recovery from model replies
//! - [`pipeline`] - Batch orchestration with bounded concurrency
//! - [`export`] - JSON and CSV result export
//! - [`sitemap`] - Sitemap-based URL discovery
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod export;
pub mod fetch;
pub mod model;
pub mod outcome;
pub mod pipeline;
pub mod prompt;
pub mod recover;
pub mod reduce;
pub mod schema;
pub mod sitemap;
pub mod testing;

// Re-export core types at crate root
pub use error::{
    ExportError, FetchError, ModelError, ParseError, PipelineError, SchemaError,
};
pub use export::export_outcomes;
pub use fetch::{BrowserFetcher, Fetcher, HttpFetcher};
pub use model::{AnthropicClient, ModelClient};
pub use outcome::{BatchResult, Failure, Outcome, Record};
pub use pipeline::{Extractor, ExtractorConfig, DEFAULT_CONCURRENCY};
pub use prompt::build_extraction_prompt;
pub use recover::recover_json;
pub use reduce::{Reducer, MAX_CONTENT_CHARS};
pub use schema::{FieldType, Schema};
pub use sitemap::discover_sitemap_urls;
