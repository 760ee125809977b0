//! LLM boundary: chat message types, the client trait, and provider errors.
//!
//! Everything the agent knows about the model goes through [`LlmClient`], so
//! tests can swap in a scripted client.

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A single chat message, one variant per role.
///
/// Serializes to the OpenAI chat wire format with a `role` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Plain assistant text with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Textual content of the message, if it has any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content } | Self::Tool { content, .. } => {
                Some(content.as_str())
            }
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }
}

/// A model-issued request to run a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

/// Function name and raw JSON argument payload of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Why a tool call's argument payload could not be used.
#[derive(Debug, Error)]
pub enum ArgumentsError {
    #[error("arguments are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arguments must be a JSON object, got: {0}")]
    NotAnObject(String),
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Parse the argument payload into a name -> value mapping.
    pub fn parse_arguments(&self) -> Result<Map<String, Value>, ArgumentsError> {
        match serde_json::from_str::<Value>(&self.function.arguments)? {
            Value::Object(map) => Ok(map),
            other => Err(ArgumentsError::NotAnObject(other.to_string())),
        }
    }
}

/// How the model may pick tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
}

/// Per-request sampling and tool options.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionOptions {
    pub tool_choice: Option<ToolChoice>,
    pub temperature: Option<f32>,
}

impl CompletionOptions {
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// The model's reply: optional text plus zero or more tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(call: ToolCall) -> Self {
        Self {
            content: None,
            tool_calls: vec![call],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant message recording this reply in a transcript.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage::Assistant {
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
        }
    }
}

/// Model/provider failures.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("provider response contained no choices")]
    EmptyResponse,

    #[error("model call timed out after {0} seconds")]
    Timeout(u64),
}

/// A chat-completion capable model backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `messages` (and optional tool schemas) and return the first choice.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
        options: CompletionOptions,
    ) -> Result<ChatResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_serialize_with_role_tag() {
        let tool = ChatMessage::Tool {
            tool_call_id: "call_1".to_string(),
            content: "42".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&tool).unwrap(),
            json!({"role": "tool", "tool_call_id": "call_1", "content": "42"})
        );

        let plain = ChatMessage::assistant("done");
        assert_eq!(
            serde_json::to_value(&plain).unwrap(),
            json!({"role": "assistant", "content": "done"})
        );
    }

    #[test]
    fn assistant_tool_calls_use_wire_shape() {
        let response = ChatResponse::tool_call(ToolCall::new(
            "call_9",
            "search",
            r#"{"query":"India GDP growth"}"#,
        ));
        let value = serde_json::to_value(response.to_message()).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], Value::Null);
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["name"], "search");
    }

    #[test]
    fn parse_arguments_rejects_non_objects() {
        let call = ToolCall::new("c", "calculate", r#"{"expression": "1 + 1"}"#);
        let args = call.parse_arguments().expect("object");
        assert_eq!(args["expression"], "1 + 1");

        let call = ToolCall::new("c", "calculate", "{not valid json");
        assert!(matches!(call.parse_arguments(), Err(ArgumentsError::Json(_))));

        let call = ToolCall::new("c", "calculate", "[1, 2]");
        assert!(matches!(
            call.parse_arguments(),
            Err(ArgumentsError::NotAnObject(_))
        ));
    }

    #[test]
    fn content_reads_every_role() {
        assert_eq!(ChatMessage::system("s").content(), Some("s"));
        assert_eq!(
            ChatMessage::Assistant {
                content: None,
                tool_calls: Vec::new()
            }
            .content(),
            None
        );
    }
}
