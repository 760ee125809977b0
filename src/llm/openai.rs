//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ChatMessage, ChatResponse, CompletionOptions, LlmClient, LlmError, ToolCall};
use crate::config::Config;

/// Client for `POST {base_url}/chat/completions`.
pub struct OpenAiClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_key.clone(), config.base_url.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Build the JSON request body for a completion call.
fn build_request_body(
    model: &str,
    messages: &[ChatMessage],
    tools: Option<&[Value]>,
    options: CompletionOptions,
) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
    });

    if let Some(tools) = tools.filter(|t| !t.is_empty()) {
        body["tools"] = json!(tools);
        if let Some(choice) = options.tool_choice {
            body["tool_choice"] = json!(choice);
        }
    }

    if let Some(temperature) = options.temperature {
        body["temperature"] = json!(temperature);
    }

    body
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

fn parse_response(raw: &str) -> Result<ChatResponse, LlmError> {
    let parsed: CompletionResponse =
        serde_json::from_str(raw).map_err(|e| LlmError::Decode(e.to_string()))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;

    Ok(ChatResponse {
        content: choice.message.content,
        tool_calls: choice.message.tool_calls.unwrap_or_default(),
    })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
        options: CompletionOptions,
    ) -> Result<ChatResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let body = build_request_body(model, messages, tools, options);

        tracing::debug!(
            "POST {} model={} messages={}",
            self.endpoint(),
            model,
            messages.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolChoice;

    #[test]
    fn request_body_includes_tools_and_temperature() {
        let messages = vec![ChatMessage::user("hi")];
        let tools = vec![json!({"type": "function", "function": {"name": "search"}})];
        let body = build_request_body(
            "gpt-4o-mini",
            &messages,
            Some(&tools),
            CompletionOptions::default()
                .with_tool_choice(ToolChoice::Auto)
                .with_temperature(0.0),
        );

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["tools"][0]["function"]["name"], "search");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["temperature"], 0.0);
    }

    #[test]
    fn request_body_omits_tool_fields_without_tools() {
        let body = build_request_body(
            "gpt-4o-mini",
            &[ChatMessage::user("plan")],
            None,
            CompletionOptions::default().with_tool_choice(ToolChoice::Auto),
        );
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn parses_tool_call_response() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "search", "arguments": "{\"query\":\"GDP growth\"}"}
                    }]
                }
            }]
        }"#;
        let response = parse_response(raw).expect("parse");
        assert_eq!(response.content, None);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(response.tool_calls[0].name(), "search");
    }

    #[test]
    fn parses_text_response_and_rejects_empty_choices() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "1. Find it."}}]}"#;
        let response = parse_response(raw).expect("parse");
        assert_eq!(response.content.as_deref(), Some("1. Find it."));
        assert!(response.tool_calls.is_empty());

        assert!(matches!(
            parse_response(r#"{"choices": []}"#),
            Err(LlmError::EmptyResponse)
        ));
        assert!(matches!(parse_response("oops"), Err(LlmError::Decode(_))));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = OpenAiClient::new(None, "http://127.0.0.1:9");
        let err = client
            .chat_completion(
                "gpt-4o-mini",
                &[ChatMessage::user("hi")],
                None,
                CompletionOptions::default(),
            )
            .await
            .expect_err("should fail");
        assert!(matches!(err, LlmError::MissingApiKey));
    }
}
