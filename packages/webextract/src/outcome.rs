//! Per-URL outcomes and batch results.
//!
//! Every input URL produces exactly one [`Outcome`]: a structured record
//! on success, or a typed failure carrying the URL and the triggering
//! error's message. Failure is data, not an exception — the batch loop
//! consumes both variants uniformly.

use serde::Serialize;
use serde_json::{Map, Value};

/// Fixed provenance tag merged into every successful record.
pub const SOURCE_TAG: &str = "webextract";

/// Key under which the source URL is stored.
pub const URL_KEY: &str = "url";

/// Key for the provenance tag. Excluded from CSV columns.
pub const SOURCE_KEY: &str = "source";

/// Key for the failure error message.
pub const ERROR_KEY: &str = "error";

/// Failure marker flag. Excluded from CSV columns.
pub const FAILURE_MARKER_KEY: &str = "parse_error";

/// A successfully extracted record: the model's fields merged with the
/// source URL and provenance tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from extracted fields, merging in `url` and the
    /// provenance tag.
    pub fn new(url: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.insert(URL_KEY.to_string(), Value::String(url.into()));
        fields.insert(SOURCE_KEY.to_string(), Value::String(SOURCE_TAG.to_string()));
        Self { fields }
    }

    /// The source URL.
    pub fn url(&self) -> &str {
        self.fields
            .get(URL_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Look up an extracted field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All fields including `url` and the provenance tag.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// A per-URL failure: the URL plus a human-readable error message.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub url: String,
    pub error: String,
}

/// The unit of result: exactly one per input URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Record),
    Failure(Failure),
}

impl Outcome {
    /// Build a failure outcome from any error's display form.
    pub fn failure(url: impl Into<String>, error: impl ToString) -> Self {
        Self::Failure(Failure {
            url: url.into(),
            error: error.to_string(),
        })
    }

    /// The URL this outcome belongs to.
    pub fn url(&self) -> &str {
        match self {
            Self::Success(record) => record.url(),
            Self::Failure(failure) => &failure.url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The outcome as a JSON mapping, the shape exports work from.
    ///
    /// Failures carry the failure marker flag; successes never do.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success(record) => Value::Object(record.fields().clone()),
            Self::Failure(failure) => {
                let mut map = Map::new();
                map.insert(URL_KEY.to_string(), Value::String(failure.url.clone()));
                map.insert(ERROR_KEY.to_string(), Value::String(failure.error.clone()));
                map.insert(FAILURE_MARKER_KEY.to_string(), Value::Bool(true));
                Value::Object(map)
            }
        }
    }
}

/// An ordered sequence of outcomes, one per input URL, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    outcomes: Vec<Outcome>,
}

impl BatchResult {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }

    /// Successful records, in input order.
    pub fn successes(&self) -> impl Iterator<Item = &Record> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Success(record) => Some(record),
            Outcome::Failure(_) => None,
        })
    }

    /// Failures, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &Failure> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Failure(failure) => Some(failure),
            Outcome::Success(_) => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// All outcomes as JSON mappings, in input order.
    pub fn to_values(&self) -> Vec<Value> {
        self.outcomes.iter().map(Outcome::to_value).collect()
    }
}

impl IntoIterator for BatchResult {
    type Item = Outcome;
    type IntoIter = std::vec::IntoIter<Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget_fields() -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("Widget"));
        fields.insert("price".to_string(), json!(19.99));
        fields
    }

    #[test]
    fn test_record_merges_url_and_provenance() {
        let record = Record::new("https://example.com", widget_fields());

        assert_eq!(record.url(), "https://example.com");
        assert_eq!(record.get("title"), Some(&json!("Widget")));
        assert_eq!(record.get(SOURCE_KEY), Some(&json!(SOURCE_TAG)));
    }

    #[test]
    fn test_success_value_has_no_failure_marker() {
        let outcome = Outcome::Success(Record::new("https://example.com", widget_fields()));
        let value = outcome.to_value();

        assert!(value.get(FAILURE_MARKER_KEY).is_none());
        assert_eq!(value["price"], json!(19.99));
    }

    #[test]
    fn test_failure_value_carries_marker_and_message() {
        let outcome = Outcome::failure("https://example.com", "HTTP 404 for https://example.com");
        let value = outcome.to_value();

        assert_eq!(value[FAILURE_MARKER_KEY], json!(true));
        assert_eq!(value[URL_KEY], json!("https://example.com"));
        assert!(value[ERROR_KEY].as_str().unwrap().contains("404"));
    }

    #[test]
    fn test_batch_counts_and_order() {
        let batch = BatchResult::new(vec![
            Outcome::Success(Record::new("https://a.com", widget_fields())),
            Outcome::failure("https://b.com", "timeout fetching: https://b.com"),
            Outcome::Success(Record::new("https://c.com", widget_fields())),
        ]);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.success_count(), 2);
        assert_eq!(batch.failure_count(), 1);

        let urls: Vec<_> = batch.iter().map(Outcome::url).collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
    }
}
