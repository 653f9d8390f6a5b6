//! Sitemap discovery.
//!
//! Probes the conventional sitemap locations of a site and pulls page URLs
//! out of the XML, so a whole site can be fed into an extraction batch
//! without listing URLs by hand.

use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::fetch::USER_AGENT;

/// Conventional locations probed in order. The first one that answers with
/// a parseable, non-empty sitemap wins.
const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap-index.xml"];

const SITEMAP_TIMEOUT: Duration = Duration::from_secs(30);

/// Discover page URLs from a site's sitemap.
///
/// Returns an empty list when no sitemap is found or when the site only
/// publishes a sitemap index. `limit` caps the number of URLs returned.
pub async fn discover_sitemap_urls(base_url: &str, limit: Option<usize>) -> FetchResult<Vec<String>> {
    let base = Url::parse(base_url).map_err(|_| FetchError::InvalidUrl {
        url: base_url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(SITEMAP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Http(Box::new(e)))?;

    for path in SITEMAP_PATHS {
        let sitemap_url = match base.join(path) {
            Ok(u) => u,
            Err(_) => continue,
        };

        let response = match client.get(sitemap_url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(url = %sitemap_url, error = %e, "sitemap probe failed");
                continue;
            }
        };
        if !response.status().is_success() {
            debug!(url = %sitemap_url, status = %response.status(), "sitemap probe rejected");
            continue;
        }

        let xml = match response.text().await {
            Ok(t) => t,
            Err(_) => continue,
        };

        let urls = parse_sitemap(&xml, limit);
        if !urls.is_empty() {
            debug!(url = %sitemap_url, count = urls.len(), "sitemap discovered");
            return Ok(urls);
        }
    }

    Ok(Vec::new())
}

/// Pull `<loc>` values of `<url>` entries out of sitemap XML.
///
/// A sitemap index (`<sitemapindex>` root) yields an empty list; its `<loc>`
/// entries point at other sitemaps, not at pages.
pub fn parse_sitemap(xml: &str, limit: Option<usize>) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" => return Vec::new(),
                b"url" => in_url = true,
                b"loc" => in_loc = in_url,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"url" => in_url = false,
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Text(text)) if in_loc => {
                if let Ok(loc) = text.unescape() {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        urls.push(loc.to_string());
                        if limit.is_some_and(|l| urls.len() >= l) {
                            return urls;
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "sitemap XML malformed, keeping URLs seen so far");
                break;
            }
        }
    }

    urls
}
