// End-to-end status classification tests that need no live browser.
//
// Everything past input validation requires a WebDriver endpoint; these
// tests exercise the paths in front of it plus the fault classification
// that fires when the endpoint is unreachable.

use std::time::Duration;
use tempfile::TempDir;

use lensprobe::browser::BrowserType;
use lensprobe::config::Config;
use lensprobe::session::SearchRunner;
use lensprobe::types::{SearchCategory, SearchRequest, StatusCode};

fn test_config(data_dir: &std::path::Path) -> Config {
    Config {
        api_key: None,
        api_base: "http://127.0.0.1:1".to_string(),
        model: "gpt-4o".to_string(),
        webhook_url: None,
        data_dir: data_dir.to_path_buf(),
        // Nothing listens here; acquiring a session must fail fast
        webdriver_url: "http://127.0.0.1:9".to_string(),
        lens_base: "https://lens.google.com".to_string(),
        headless: true,
        search_deadline: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_browser_work() {
    let dir = TempDir::new().unwrap();
    let runner = SearchRunner::new(test_config(dir.path()), BrowserType::Firefox);

    let outcome = runner
        .search(&SearchRequest {
            image_url: "not-a-url".to_string(),
            category: SearchCategory::All,
        })
        .await;

    assert_eq!(outcome.status_code, StatusCode::InvalidInput);
    assert_eq!(outcome.status, "invalid_input");
    assert_eq!(outcome.total_results, 0);
    assert!(outcome.result.is_empty());
}

#[tokio::test]
async fn non_http_scheme_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    let runner = SearchRunner::new(test_config(dir.path()), BrowserType::Firefox);

    let outcome = runner
        .search(&SearchRequest {
            image_url: "file:///etc/hosts".to_string(),
            category: SearchCategory::Both,
        })
        .await;

    assert_eq!(outcome.status_code, StatusCode::InvalidInput);
    assert_eq!(outcome.total_results, 0);
}

#[tokio::test]
async fn unreachable_webdriver_is_classified_not_raised() {
    let dir = TempDir::new().unwrap();
    let runner = SearchRunner::new(test_config(dir.path()), BrowserType::Firefox);

    let outcome = runner
        .search(&SearchRequest {
            image_url: "https://example.com/photo.jpg".to_string(),
            category: SearchCategory::All,
        })
        .await;

    // The session acquisition fault maps into the taxonomy; the caller
    // still gets a complete structured outcome
    assert_eq!(outcome.status_code, StatusCode::InternalError);
    assert_eq!(outcome.total_results, 0);
    assert!(!outcome.message.is_empty());
}

#[tokio::test]
async fn stores_are_persisted_after_every_search() {
    let dir = TempDir::new().unwrap();
    let runner = SearchRunner::new(test_config(dir.path()), BrowserType::Firefox);

    runner
        .search(&SearchRequest {
            image_url: "not-a-url".to_string(),
            category: SearchCategory::All,
        })
        .await;

    assert!(dir.path().join("selector_stats.json").exists());
    assert!(dir.path().join("script_cache.json").exists());
}

#[tokio::test]
async fn outcome_wire_shape() {
    let dir = TempDir::new().unwrap();
    let runner = SearchRunner::new(test_config(dir.path()), BrowserType::Firefox);

    let outcome = runner
        .search(&SearchRequest {
            image_url: "not-a-url".to_string(),
            category: SearchCategory::All,
        })
        .await;

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status_code"], serde_json::json!(400));
    assert_eq!(json["total_results"], serde_json::json!(0));
    assert_eq!(json["status"], serde_json::json!("invalid_input"));
    assert!(json["result"].as_object().unwrap().is_empty());
    assert!(json["message"].as_str().unwrap().contains("not-a-url"));
}
