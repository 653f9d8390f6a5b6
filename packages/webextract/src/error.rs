//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! `FetchError`, `ModelError` and `ParseError` are per-URL errors: the
//! pipeline catches them at the single-URL boundary and converts them to
//! a failure outcome, so they never abort a batch. `SchemaError` and
//! `ExportError` are invocation-level and surface immediately.

use thiserror::Error;

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection, DNS, protocol)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The fetch exceeded its timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Browser launch, navigation or capture failed
    #[error("browser error: {0}")]
    Browser(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur while calling the model endpoint.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Transport failure talking to the API
    #[error("model request failed: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The API returned a non-success status
    #[error("model API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The reply contained no text content
    #[error("model returned an empty reply")]
    Empty,

    /// No API key in the environment
    #[error("ANTHROPIC_API_KEY not set")]
    MissingApiKey,
}

/// Raised when every recovery stage failed to extract JSON from a reply.
#[derive(Debug, Error)]
pub enum ParseError {
    /// All recovery stages exhausted; carries a bounded excerpt of the reply
    #[error("could not parse model reply as a JSON object: {excerpt:?}")]
    Unrecoverable { excerpt: String },
}

/// Errors raised while loading or validating a schema file.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema file could not be read
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// Schema file is not valid JSON
    #[error("schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top level of the schema must be a JSON object
    #[error("schema must be a JSON object mapping field names to types")]
    NotAnObject,

    /// Field names must be non-empty
    #[error("schema contains an empty field name")]
    EmptyFieldName,

    /// Type tag outside the closed set
    #[error("invalid type {type_tag:?} for field {field:?}: must be one of string, number, boolean, array, object")]
    InvalidType { field: String, type_tag: String },
}

/// Errors raised while exporting results.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Output extension is not a supported format
    #[error("unsupported output format {extension:?}: use .json or .csv")]
    UnsupportedFormat { extension: String },

    /// Output file could not be written
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed
    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Union of the errors a single-URL pipeline can produce.
///
/// The orchestrator converts this to a failure outcome; it never crosses
/// the batch boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for model calls.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type alias for response recovery.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for single-URL pipeline runs.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
