// Unit tests for the script generation client

use super::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_extract_tagged_fence() {
    let reply = "Here you go:\n```javascript\n() => { return true; }\n```\nDone.";
    assert_eq!(extract_code_block(reply), "() => { return true; }");
}

#[test]
fn test_extract_bare_fence() {
    let reply = "```\n() => false\n```";
    assert_eq!(extract_code_block(reply), "() => false");
}

#[test]
fn test_extract_without_fence_is_verbatim() {
    let reply = "  () => document.title  ";
    assert_eq!(extract_code_block(reply), "() => document.title");
}

#[test]
fn test_extract_unterminated_fence() {
    let reply = "```javascript\n() => 1";
    assert_eq!(extract_code_block(reply), "() => 1");
}

#[test]
fn test_task_templates_mention_their_subject() {
    let click = click_task("search_button", "Search");
    assert!(click.contains("'Search'"));
    assert!(click.contains("search button"));

    let fill = fill_task("url_input");
    assert!(fill.contains("url input"));

    let extract = extract_task("Visual matches");
    assert!(extract.contains("Visual matches"));
}

fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn test_generate_extracts_fenced_script() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "```javascript\n() => { document.querySelector('button').click(); return true; }\n```",
        )))
        .mount(&server)
        .await;

    let client = ScriptGenClient::new("test-key", server.uri(), "gpt-4o");
    let script = client.generate("click the button", None).await.unwrap();
    assert!(script.starts_with("() =>"));
    assert!(script.contains("querySelector"));
}

#[tokio::test]
async fn test_generate_takes_raw_reply_without_fence() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("() => true")))
        .mount(&server)
        .await;

    let client = ScriptGenClient::new("k", server.uri(), "gpt-4o");
    let script = client.generate("do a thing", Some("<html></html>")).await.unwrap();
    assert_eq!(script, "() => true");
}

#[tokio::test]
async fn test_generate_surfaces_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = ScriptGenClient::new("k", server.uri(), "gpt-4o");
    let err = client.generate("task", None).await.unwrap_err();
    match err {
        GenerationError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_rejects_empty_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("   ")))
        .mount(&server)
        .await;

    let client = ScriptGenClient::new("k", server.uri(), "gpt-4o");
    let err = client.generate("task", None).await.unwrap_err();
    assert!(matches!(err, GenerationError::EmptyReply));
}
