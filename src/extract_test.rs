// Unit tests for extraction parsing and the page heuristics

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_blocking_markers() {
    assert!(is_blocking_page("Our systems have detected unusual traffic from your network"));
    assert!(is_blocking_page("Please solve this CAPTCHA to continue"));
    assert!(!is_blocking_page("<html><body>Visual matches</body></html>"));
}

#[test]
fn test_no_matches_phrase_alone_suffices() {
    let content = "<div>No matches for your search</div>";
    assert!(no_matches_in(content, Some(50)));
}

#[test]
fn test_no_matches_link_count_alone_suffices() {
    // No phrase anywhere, but the page has zero external links
    let content = "<html><body><div>plenty of markup, no results</div></body></html>";
    assert!(no_matches_in(content, Some(0)));
    assert!(no_matches_in(content, Some(1)));
}

#[test]
fn test_healthy_page_is_not_empty() {
    let content = "<html><body>Visual matches galore</body></html>";
    assert!(!no_matches_in(content, Some(25)));
}

#[test]
fn test_unknown_link_count_falls_back_to_phrases() {
    let content = "<html><body>results</body></html>";
    assert!(!no_matches_in(content, None));
    assert!(no_matches_in("No results found", None));
}

#[test]
fn test_phrase_matching_is_case_insensitive() {
    assert!(no_matches_in("NO MATCHES FOUND", Some(10)));
}

#[test]
fn test_parse_extracted_strings() {
    let value = json!([
        "https://shop.example/product/1",
        "https://other.example/page",
        "not-a-url",
        ""
    ]);
    let items = parse_extracted(&value);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].url(), "https://shop.example/product/1");
}

#[test]
fn test_parse_extracted_records() {
    let value = json!([
        {
            "url": "https://shop.example/product/1",
            "title": "Blue Widget",
            "description": "A very blue widget",
            "thumbnail": "https://cdn.example/w.jpg"
        },
        {
            "link": "https://other.example/page",
            "title": "",
            "description": "",
            "thumbnail": null
        }
    ]);

    let items = parse_extracted(&value);
    assert_eq!(items.len(), 2);

    match &items[0] {
        ExtractedItem::Record(record) => {
            assert_eq!(record.title, "Blue Widget");
            assert_eq!(record.thumbnail.as_deref(), Some("https://cdn.example/w.jpg"));
        }
        other => panic!("expected record, got {:?}", other),
    }

    // Metadata-free objects degrade to bare URLs
    assert_eq!(items[1], ExtractedItem::Url("https://other.example/page".to_string()));
}

#[test]
fn test_parse_extracted_dedupes_by_url() {
    let value = json!([
        "https://shop.example/product/1",
        { "url": "https://shop.example/product/1", "title": "Dup", "description": "" },
        "https://shop.example/product/2"
    ]);
    let items = parse_extracted(&value);
    assert_eq!(items.len(), 2);
}

#[test]
fn test_parse_extracted_ignores_non_arrays() {
    assert!(parse_extracted(&json!("https://a.example")).is_empty());
    assert!(parse_extracted(&json!({"url": "https://a.example"})).is_empty());
    assert!(parse_extracted(&json!(null)).is_empty());
    assert!(parse_extracted(&json!(42)).is_empty());
}

#[test]
fn test_parse_extracted_caps_results() {
    let urls: Vec<String> = (0..600).map(|i| format!("https://example.com/{}", i)).collect();
    let items = parse_extracted(&json!(urls));
    assert_eq!(items.len(), 500);
}

#[test]
fn test_parse_extracted_skips_malformed_entries() {
    let value = json!([
        42,
        ["nested"],
        { "title": "no url at all", "description": "x" },
        "https://ok.example/page"
    ]);
    let items = parse_extracted(&value);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url(), "https://ok.example/page");
}
