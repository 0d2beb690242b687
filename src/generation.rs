//! Script generation via an OpenAI-compatible chat-completions endpoint.
//!
//! The client sends a fixed system prompt plus a task description and an
//! optional slice of page markup, and extracts a single in-page JavaScript
//! function from the reply. Retry policy belongs to callers; this client
//! makes exactly one attempt.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Markup context beyond this many characters is not worth the tokens
const PAGE_CONTEXT_LIMIT: usize = 6000;

const SYSTEM_PROMPT: &str = "You are a browser automation expert. Generate a single \
JavaScript function expression that performs the requested task when executed inside \
the page. The function must:\n\
1. Be a self-contained arrow function, e.g. (value) => { ... }\n\
2. Take only the arguments the task names (none for clicks, the input value for fills)\n\
3. Locate elements with document.querySelector/querySelectorAll using resilient \
attribute, role, and text cues\n\
4. Return true on success and false on failure for interaction tasks\n\
5. Return an array of result objects for extraction tasks\n\
6. Never use await, fetch, or any API that leaves the page\n\
Only return the function code, no explanations.";

/// Task description for generating a click script
pub fn click_task(element_type: &str, element_name: &str) -> String {
    format!(
        "Write a function that clicks the '{}' element (a {}). Prefer role-based and \
         visible-text cues such as [role] attributes, aria-label, or matching text \
         content. Wait-free: the element is already rendered. Click it once and return \
         true, or return false if it cannot be found.",
        element_name,
        element_type.replace('_', " ")
    )
}

/// Task description for generating a fill script
pub fn fill_task(element_type: &str) -> String {
    format!(
        "Write a function taking one argument (value) that fills the {} input field \
         with it. Locate the field via placeholder, aria-label, or type attributes, \
         set its value, dispatch 'input' and 'change' events so framework listeners \
         fire, and return true. Return false if no suitable field exists.",
        element_type.replace('_', " ")
    )
}

/// Task description for generating an extraction script
pub fn extract_task(tab_name: &str) -> String {
    format!(
        "Write a function that extracts external result links from the current '{}' \
         results page. Collect anchors whose href starts with http, excluding the \
         search engine's own domains (google.*, gstatic.com, googleusercontent.com, \
         lens.google.com) and data:/blob: URLs. Return an array of unique href strings.",
        tab_name
    )
}

/// Failure modes of the generation service
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generation service returned no usable script")]
    EmptyReply,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for the script generation service
pub struct ScriptGenClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl ScriptGenClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        ScriptGenClient {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_base: api_base.into(),
            model: model.into(),
        }
    }

    /// Ask the service for a script performing `task`, optionally grounding
    /// it with the leading slice of the current page markup.
    pub async fn generate(
        &self,
        task: &str,
        page_context: Option<&str>,
    ) -> Result<String, GenerationError> {
        info!("Requesting generated script for task: {}", task);

        let mut messages = vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: task.to_string(),
            },
        ];

        if let Some(context) = page_context {
            let clipped: String = context.chars().take(PAGE_CONTEXT_LIMIT).collect();
            messages.push(ChatMessage {
                role: "user",
                content: format!("Page HTML context: {}", clipped),
            });
        }

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: 1000,
            temperature: 0.1,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyReply)?;

        let script = extract_code_block(content);
        if script.is_empty() {
            return Err(GenerationError::EmptyReply);
        }

        debug!("Generated script ({} bytes)", script.len());
        Ok(script)
    }
}

/// Take the contents of the first fenced code block, or the raw reply
/// verbatim when no fence is present.
pub fn extract_code_block(reply: &str) -> String {
    match reply.find("```") {
        Some(start) => {
            let after = &reply[start + 3..];
            // Skip a language tag line like ```javascript
            let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
            let body = &after[body_start..];
            let end = body.find("```").unwrap_or(body.len());
            body[..end].trim().to_string()
        }
        None => reply.trim().to_string(),
    }
}

#[cfg(test)]
#[path = "generation_test.rs"]
mod generation_test;
