//! Ordered message history for one run.

use thiserror::Error;

use crate::llm::{ChatMessage, ChatResponse, ToolCall};

use super::prompt::REACTIVE_SYSTEM_PROMPT;

#[derive(Debug, Error, PartialEq)]
pub enum TranscriptError {
    #[error("tool result '{0}' does not answer a tool call from the preceding assistant message")]
    UnmatchedToolCallId(String),
}

/// Append-only transcript.
///
/// Tool messages are only accepted directly after the assistant message that
/// requested them (possibly after sibling tool results) and must carry one of
/// its tool call ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(prompt)],
        }
    }

    /// Fresh transcript for reactive mode.
    pub fn reactive() -> Self {
        Self::with_system(REACTIVE_SYSTEM_PROMPT)
    }

    pub fn push(&mut self, message: ChatMessage) -> Result<(), TranscriptError> {
        if let ChatMessage::Tool { tool_call_id, .. } = &message {
            if !self.awaits_result_for(tool_call_id) {
                return Err(TranscriptError::UnmatchedToolCallId(tool_call_id.clone()));
            }
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, response: &ChatResponse) {
        self.messages.push(response.to_message());
    }

    pub fn push_tool_result(
        &mut self,
        call: &ToolCall,
        content: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        self.push(ChatMessage::Tool {
            tool_call_id: call.id.clone(),
            content: content.into(),
        })
    }

    fn awaits_result_for(&self, id: &str) -> bool {
        let requester = self
            .messages
            .iter()
            .rev()
            .find(|m| !matches!(m, ChatMessage::Tool { .. }));
        match requester {
            Some(ChatMessage::Assistant { tool_calls, .. }) => {
                tool_calls.iter().any(|c| c.id == id)
            }
            _ => false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Content of the last message, or an empty string.
    pub fn last_content(&self) -> String {
        self.last()
            .and_then(ChatMessage::content)
            .unwrap_or_default()
            .to_string()
    }

    pub fn tool_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(|m| matches!(m, ChatMessage::Tool { .. }))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
