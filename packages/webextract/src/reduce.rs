//! Content reducer: raw markup to bounded plain text.
//!
//! Converts HTML to markdown so the model sees readable text instead of
//! tag soup. Link targets and image references survive the conversion —
//! they carry extraction-relevant signal (contact links, product images).
//! A hard character cap bounds the downstream prompt; truncation is a
//! deliberate lossy tradeoff, not an error.

use scraper::Html;

/// Hard cap on reduced text length, in characters.
pub const MAX_CONTENT_CHARS: usize = 50_000;

/// Marker appended to the retained prefix when content is truncated.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Stateless reducer configuration, passed explicitly into the pipeline.
///
/// Pure: no I/O, no shared state. Identical input yields identical output.
#[derive(Debug, Clone)]
pub struct Reducer {
    max_chars: usize,
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer {
    /// Create a reducer with the standard 50,000 character cap.
    pub fn new() -> Self {
        Self {
            max_chars: MAX_CONTENT_CHARS,
        }
    }

    /// Override the character cap. Intended for tests.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// The configured cap.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Reduce raw markup to bounded markdown-ish text.
    pub fn reduce(&self, html: &str) -> String {
        let text = html_to_markdown(html);
        self.truncate(text)
    }

    /// Apply the cap: content at or under it is untouched; beyond it the
    /// prefix of exactly `max_chars` characters is kept and the fixed
    /// marker appended.
    fn truncate(&self, text: String) -> String {
        match text.char_indices().nth(self.max_chars) {
            None => text,
            Some((byte_idx, _)) => {
                let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
                out.push_str(&text[..byte_idx]);
                out.push_str(TRUNCATION_MARKER);
                out
            }
        }
    }
}

/// Convert HTML to markdown, keeping links and images inline.
///
/// Falls back to plain text extraction if conversion fails on malformed
/// markup.
fn html_to_markdown(html: &str) -> String {
    htmd::convert(html)
        .unwrap_or_else(|_| {
            let document = Html::parse_document(html);
            document.root_element().text().collect::<String>()
        })
        .trim()
        .to_string()
}
