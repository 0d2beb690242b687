// Unit tests for validation, the deep-link builder, and key shaping

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_validate_accepts_http_and_https() {
    assert!(validate_image_url("https://example.com/photo.jpg").is_ok());
    assert!(validate_image_url("http://example.com/photo.jpg").is_ok());
}

#[test]
fn test_validate_rejects_garbage() {
    assert!(validate_image_url("not-a-url").is_err());
    assert!(validate_image_url("").is_err());
    assert!(validate_image_url("example.com/photo.jpg").is_err());
}

#[test]
fn test_validate_rejects_non_http_schemes() {
    assert!(validate_image_url("file:///etc/passwd").is_err());
    assert!(validate_image_url("ftp://example.com/photo.jpg").is_err());
    assert!(validate_image_url("data:image/png;base64,AAAA").is_err());
}

#[test]
fn test_deep_link_encodes_the_image_url() {
    let link = build_deep_link(
        "https://lens.google.com",
        "https://example.com/a photo.jpg?x=1&y=2",
        SearchCategory::All,
    );

    assert!(link.starts_with("https://lens.google.com/uploadbyurl?url="));
    // The embedded URL must not leak raw separators into the outer query
    assert!(link.contains("https%3A%2F%2Fexample.com"));
    assert!(!link.contains("photo.jpg?x"));
    assert!(link.contains("&ep=cntpubu"));
    assert!(link.contains("&st="));
}

#[test]
fn test_deep_link_category_modes() {
    let exact = build_deep_link("https://l.example", "https://e.com/p.jpg", SearchCategory::ExactMatches);
    assert!(exact.contains("udm=48"));
    assert!(exact.contains("lns_mode=un"));

    let visual = build_deep_link("https://l.example", "https://e.com/p.jpg", SearchCategory::VisualMatches);
    assert!(visual.contains("udm=44"));
    assert!(visual.contains("lns_mode=visual"));

    let all = build_deep_link("https://l.example", "https://e.com/p.jpg", SearchCategory::All);
    assert!(!all.contains("udm="));

    let both = build_deep_link("https://l.example", "https://e.com/p.jpg", SearchCategory::Both);
    assert!(!both.contains("udm="));
}

#[test]
fn test_tab_key_shape() {
    assert_eq!(tab_key("Visual matches"), "visual_matches");
    assert_eq!(tab_key("Exact matches"), "exact_matches");
    assert_eq!(tab_key("All"), "all");
}
