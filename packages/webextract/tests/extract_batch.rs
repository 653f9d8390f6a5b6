//! Integration tests for the batch extraction pipeline.
//!
//! These tests verify the full extraction workflow:
//! 1. Fetch pages
//! 2. Reduce to text and build prompts
//! 3. Recover structured JSON from model replies
//! 4. Gather ordered outcomes under the concurrency cap

use std::time::Duration;

use serde_json::json;
use webextract::{
    testing::{MockFetcher, MockModel},
    Extractor, Outcome, Schema,
};

fn product_schema() -> Schema {
    Schema::from_json(r#"{"title": "string", "price": "number"}"#).unwrap()
}

#[tokio::test]
async fn test_end_to_end_product_extraction() {
    let fetcher = MockFetcher::new().with_page(
        "https://shop.test/widget",
        "<html><body><h1>Widget</h1><p>Only $19.99 while stocks last</p></body></html>",
    );
    let model = MockModel::new()
        .with_reply_for("Widget", r#"{"title": "Widget", "price": 19.99}"#);
    let extractor = Extractor::new(fetcher, model);

    let urls = vec!["https://shop.test/widget".to_string()];
    let batch = extractor.extract_batch(&urls, &product_schema()).await;

    assert_eq!(batch.success_count(), 1);
    let record = batch.successes().next().unwrap();
    assert_eq!(record.get("title"), Some(&json!("Widget")));
    assert_eq!(record.get("price"), Some(&json!(19.99)));
    assert_eq!(record.get("url"), Some(&json!("https://shop.test/widget")));
    assert_eq!(record.get("source"), Some(&json!("webextract")));
}

#[tokio::test]
async fn test_batch_preserves_input_order_and_length() {
    let mut fetcher = MockFetcher::new();
    for i in 0..6 {
        fetcher = fetcher.with_page(format!("https://site.test/{i}"), format!("<p>page {i}</p>"));
    }
    let model = MockModel::new().with_reply(r#"{"title": "x", "price": 1}"#);
    let extractor = Extractor::new(fetcher, model).with_concurrency(3);

    let urls: Vec<String> = (0..6).map(|i| format!("https://site.test/{i}")).collect();
    let batch = extractor.extract_batch(&urls, &product_schema()).await;

    assert_eq!(batch.len(), urls.len());
    for (outcome, url) in batch.iter().zip(&urls) {
        assert_eq!(outcome.url(), url);
    }
}

#[tokio::test]
async fn test_failures_do_not_sink_the_batch() {
    let fetcher = MockFetcher::new()
        .with_page("https://site.test/ok", "<p>fine</p>")
        .fail_url("https://site.test/down");
    let model = MockModel::new().with_reply(r#"{"title": "fine", "price": 2}"#);
    let extractor = Extractor::new(fetcher, model);

    let urls = vec![
        "https://site.test/ok".to_string(),
        "https://site.test/down".to_string(),
        "https://site.test/missing".to_string(),
    ];
    let batch = extractor.extract_batch(&urls, &product_schema()).await;

    assert_eq!(batch.len(), 3);
    assert_eq!(batch.success_count(), 1);
    assert_eq!(batch.failure_count(), 2);

    let failures: Vec<_> = batch.failures().collect();
    assert_eq!(failures[0].url, "https://site.test/down");
    assert_eq!(failures[1].url, "https://site.test/missing");
    assert!(failures[1].error.contains("404"));
}

#[tokio::test]
async fn test_concurrency_never_exceeds_cap() {
    let mut fetcher = MockFetcher::new().with_delay(Duration::from_millis(30));
    for i in 0..12 {
        fetcher = fetcher.with_page(format!("https://site.test/{i}"), "<p>x</p>");
    }
    let gauge = fetcher.clone();
    let model = MockModel::new().with_reply(r#"{"title": "x", "price": 1}"#);
    let extractor = Extractor::new(fetcher, model).with_concurrency(4);

    let urls: Vec<String> = (0..12).map(|i| format!("https://site.test/{i}")).collect();
    let batch = extractor.extract_batch(&urls, &product_schema()).await;

    assert_eq!(batch.success_count(), 12);
    assert!(gauge.max_in_flight() <= 4, "saw {} in flight", gauge.max_in_flight());
    assert!(gauge.max_in_flight() > 1, "pipelines never overlapped");
}

#[tokio::test]
async fn test_sequential_mode_runs_one_at_a_time() {
    let mut fetcher = MockFetcher::new().with_delay(Duration::from_millis(10));
    for i in 0..4 {
        fetcher = fetcher.with_page(format!("https://site.test/{i}"), "<p>x</p>");
    }
    let gauge = fetcher.clone();
    let model = MockModel::new().with_reply(r#"{"title": "x", "price": 1}"#);
    let extractor = Extractor::new(fetcher, model).sequential();

    let urls: Vec<String> = (0..4).map(|i| format!("https://site.test/{i}")).collect();
    extractor.extract_batch(&urls, &product_schema()).await;

    assert_eq!(gauge.max_in_flight(), 1);
    assert_eq!(gauge.calls(), urls);
}

#[tokio::test]
async fn test_messy_model_reply_is_recovered() {
    let fetcher = MockFetcher::new().with_page("https://site.test/messy", "<p>messy</p>");
    let model = MockModel::new().with_reply(
        "Here is the extracted data:\n```json\n{\"title\": \"Messy\", \"price\": 5}\n```\nHope that helps!",
    );
    let extractor = Extractor::new(fetcher, model);

    let outcome = extractor
        .extract_one("https://site.test/messy", &product_schema())
        .await;

    let Outcome::Success(record) = outcome else {
        panic!("expected recovery to salvage the fenced block");
    };
    assert_eq!(record.get("title"), Some(&json!("Messy")));
}

#[tokio::test]
async fn test_prompt_carries_page_content_and_schema() {
    let fetcher = MockFetcher::new().with_page(
        "https://site.test/doc",
        "<h1>Unmistakable Heading</h1>",
    );
    let model = MockModel::new().with_reply(r#"{"title": "t", "price": 0}"#);
    let probe = model.clone();
    let extractor = Extractor::new(fetcher, model);

    extractor
        .extract_one("https://site.test/doc", &product_schema())
        .await;

    let prompts = probe.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Unmistakable Heading"));
    assert!(prompts[0].contains(r#""title": "<string>""#));
    assert!(prompts[0].contains(r#""price": "<number>""#));
}
