//! Test doubles: a scripted model and recording tools.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::llm::{ChatMessage, ChatResponse, CompletionOptions, LlmClient, LlmError};
use crate::tools::Tool;

pub fn test_config() -> Config {
    Config::new(Some("sk-test".to_string()), "gpt-4o-mini".to_string())
}

/// What the agent sent on one model call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub with_tools: bool,
    pub options: CompletionOptions,
}

/// Replays queued responses in order and records every request.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ChatResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
        options: CompletionOptions,
    ) -> Result<ChatResponse, LlmError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            with_tools: tools.is_some_and(|t| !t.is_empty()),
            options,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

/// Tool with a fixed reply that records the arguments of each call.
pub struct CannedTool {
    name: String,
    reply: Value,
    calls: Mutex<Vec<Map<String, Value>>>,
}

impl CannedTool {
    pub fn new(name: &str, reply: Value) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Map<String, Value>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for CannedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "canned test tool"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, args: &Map<String, Value>) -> anyhow::Result<Value> {
        self.calls.lock().unwrap().push(args.clone());
        Ok(self.reply.clone())
    }
}

/// Wraps a real tool and records the arguments of each call.
pub struct RecordingTool {
    inner: Arc<dyn Tool>,
    calls: Mutex<Vec<Map<String, Value>>>,
}

impl RecordingTool {
    pub fn wrap(inner: Arc<dyn Tool>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Map<String, Value>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameters_schema(&self) -> Value {
        self.inner.parameters_schema()
    }

    async fn execute(&self, args: &Map<String, Value>) -> anyhow::Result<Value> {
        self.calls.lock().unwrap().push(args.clone());
        self.inner.execute(args).await
    }
}
