//! Result extraction and page classification heuristics.
//!
//! Extraction is tiered like interaction: a structural DOM harvest runs
//! first, and only when it comes back empty does a generated extraction
//! script get a turn. The no-matches and blocking checks are plain
//! functions over page text so they stay testable without a browser.

use anyhow::Result;
use fantoccini::Locator;
use serde_json::Value;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::browser::Browser;
use crate::generation::{self, ScriptGenClient};
use crate::sandbox;
use crate::types::{ExtractedItem, MatchRecord};

/// Hard cap on items per tab
const MAX_RESULTS: usize = 500;

/// Phrases the engine renders when a search came back empty
const NO_MATCHES_PHRASES: &[&str] = &[
    "no matches for your search",
    "no results found",
    "no matches found",
    "try changing the search area",
    "sending a different image",
    "better results",
    "different image",
];

/// Interstitial markers for rate limiting and CAPTCHA walls
const BLOCKING_MARKERS: &[&str] = &["unusual traffic", "captcha"];

/// At or below this many external links the page is treated as empty
const MIN_EXTERNAL_LINKS: usize = 1;

/// Structural harvest of external result links with whatever metadata the
/// surrounding markup exposes
const STRUCTURAL_EXTRACT_JS: &str = r#"
    const results = [];
    const seen = new Set();
    const excluded = [
        'google.com', 'google.co', 'gstatic.com', 'googleusercontent.com',
        'lens.google.com', 'youtube.com', 'youtu.be'
    ];

    document.querySelectorAll('a[href^="http"]').forEach(anchor => {
        const href = anchor.href;
        if (!href || seen.has(href)) return;
        if (excluded.some(domain => href.includes(domain))) return;
        if (href.includes('data:') || href.includes('blob:')) return;
        seen.add(href);

        const heading = anchor.querySelector('h3');
        const title = (heading ? heading.textContent : anchor.textContent || '').trim();

        let description = '';
        const parent = anchor.closest('div');
        if (parent) {
            const span = parent.querySelector('span');
            if (span) description = (span.textContent || '').trim();
        }

        let thumbnail = '';
        const img = anchor.querySelector('img') || (parent ? parent.querySelector('img') : null);
        if (img) thumbnail = img.src || img.getAttribute('data-src') || '';

        results.push({
            url: href,
            title: title.substring(0, 200),
            description: description.substring(0, 500),
            thumbnail: thumbnail || null
        });
    });

    return results;
"#;

/// Count of links leaving the search engine's own domains
const EXTERNAL_LINK_COUNT_JS: &str = r#"
    const links = document.querySelectorAll('a[href^="http"]');
    const external = Array.from(links).filter(link =>
        !link.href.includes('google.co') &&
        !link.href.includes('gstatic.com') &&
        !link.href.includes('googleusercontent.com'));
    return external.length;
"#;

/// Whether page content shows a rate-limit or CAPTCHA interstitial
pub fn is_blocking_page(content: &str) -> bool {
    let lower = content.to_lowercase();
    BLOCKING_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// No-matches heuristic: a known empty-state phrase, or (when the count
/// is known) too few external links. Either alone suffices. Sparse but
/// valid pages can misclassify; accepted as-is.
pub fn no_matches_in(content: &str, external_link_count: Option<usize>) -> bool {
    let lower = content.to_lowercase();
    if NO_MATCHES_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return true;
    }
    matches!(external_link_count, Some(count) if count <= MIN_EXTERNAL_LINKS)
}

/// Live no-matches check against the current page
pub async fn check_no_matches(browser: &Browser) -> bool {
    // Let late content settle before judging the page empty
    tokio::time::sleep(Duration::from_secs(2)).await;

    let content = browser.page_source_or_empty().await;
    let count = match browser.execute(EXTERNAL_LINK_COUNT_JS, vec![]).await {
        Ok(value) => value.as_u64().map(|n| n as usize),
        Err(e) => {
            warn!("Failed to count external links: {}", e);
            None
        }
    };

    no_matches_in(&content, count)
}

/// Wait for any known results-readiness signal, up to `timeout`
pub async fn wait_for_results(browser: &Browser, timeout: Duration) -> bool {
    const MARKERS: &[Locator<'static>] = &[
        Locator::Css("div[data-sokoban-container]"),
        Locator::XPath("//*[@role='tab' and normalize-space(.)='Visual matches']"),
        Locator::Css(r#"a[href^="http"]:not([href*="google."])"#),
    ];

    let deadline = Instant::now() + timeout;
    loop {
        for marker in MARKERS {
            if browser.exists(*marker).await {
                // Results render incrementally after the container appears
                tokio::time::sleep(Duration::from_secs(3)).await;
                return true;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

/// Tiered extraction for one tab: structural pass first, generated script
/// only when it yields nothing. Generation faults propagate so the
/// orchestrator can classify them; everything else degrades to empty.
pub async fn extract_items(
    browser: &Browser,
    tab_name: &str,
    generator: Option<&ScriptGenClient>,
) -> Result<Vec<ExtractedItem>> {
    tokio::time::sleep(Duration::from_secs(1)).await;

    match browser.execute(STRUCTURAL_EXTRACT_JS, vec![]).await {
        Ok(value) => {
            let items = parse_extracted(&value);
            if !items.is_empty() {
                debug!("Structural pass extracted {} items from '{}'", items.len(), tab_name);
                return Ok(items);
            }
        }
        Err(e) => warn!("Structural extraction failed on '{}': {}", tab_name, e),
    }

    let Some(generator) = generator else {
        debug!("No generation client, skipping extraction fallback for '{}'", tab_name);
        return Ok(Vec::new());
    };

    let markup = browser.page_source_or_empty().await;
    let task = generation::extract_task(tab_name);
    let script = generator
        .generate(&task, Some(&markup))
        .await
        .map_err(anyhow::Error::new)?;

    match sandbox::run_for_value(browser, &script, vec![]).await {
        Some(value) => {
            let items = parse_extracted(&value);
            debug!("Generated pass extracted {} items from '{}'", items.len(), tab_name);
            Ok(items)
        }
        None => Ok(Vec::new()),
    }
}

/// Normalize whatever an extraction script returned: strings become bare
/// URLs, objects with metadata become records, anything else is dropped.
/// Deduplicated by URL, order preserved.
pub fn parse_extracted(value: &Value) -> Vec<ExtractedItem> {
    let Some(array) = value.as_array() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for entry in array {
        let item = match entry {
            Value::String(raw) => {
                let url = raw.trim();
                url.starts_with("http").then(|| ExtractedItem::Url(url.to_string()))
            }
            Value::Object(map) => {
                let url = map
                    .get("url")
                    .or_else(|| map.get("link"))
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .trim();
                if !url.starts_with("http") {
                    None
                } else {
                    let title = text_field(map, "title");
                    let description = text_field(map, "description");
                    let thumbnail = map
                        .get("thumbnail")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from);

                    if title.is_empty() && description.is_empty() && thumbnail.is_none() {
                        Some(ExtractedItem::Url(url.to_string()))
                    } else {
                        Some(ExtractedItem::Record(MatchRecord {
                            url: url.to_string(),
                            title,
                            description,
                            thumbnail,
                        }))
                    }
                }
            }
            _ => None,
        };

        if let Some(item) = item
            && seen.insert(item.url().to_string())
        {
            items.push(item);
            if items.len() >= MAX_RESULTS {
                break;
            }
        }
    }

    items
}

fn text_field(map: &serde_json::Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod extract_test;
