//! Agent module - reactive tool loop and plan-then-execute orchestration.
//!
//! Two ways to answer a question:
//! 1. Reactive: call the model with tools, run what it asks for, feed the
//!    results back, repeat until it answers without a tool call.
//! 2. Plan-execute: ask for a numbered plan, run each step against the
//!    tool-calling model, and let the extraction rule short-circuit with a
//!    computed answer once a tool result carries the figure it needs.

mod agent_loop;
mod executor;
mod extraction;
mod planner;
mod prompt;
mod trace;
mod transcript;

#[cfg(test)]
mod testing;

pub use agent_loop::ConversationOutcome;
pub use executor::PlanOutcome;
pub use extraction::{Extraction, ExtractionRule, GrowthShareRule, State};
pub use planner::parse_plan;
pub use prompt::{build_planner_prompt, EXECUTOR_SYSTEM_PROMPT, REACTIVE_SYSTEM_PROMPT};
pub use trace::{Trace, TraceEntry, TraceKind, TraceObserver};
pub use transcript::{Transcript, TranscriptError};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::llm::{
    ArgumentsError, ChatMessage, ChatResponse, CompletionOptions, LlmClient, LlmError,
    OpenAiClient,
};
use crate::tools::{FactIndex, ToolRegistry};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model provider failure: {0}")]
    Llm(#[from] LlmError),

    #[error("malformed arguments for tool '{tool}': {source}")]
    MalformedToolArguments {
        tool: String,
        #[source]
        source: ArgumentsError,
    },

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error("no final answer after {0} model turns")]
    IterationLimit(usize),
}

/// The agent: a model, its tools, and the extraction rule for plan runs.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    rule: Arc<dyn ExtractionRule>,
    model: String,
    model_timeout: Duration,
    max_iterations: Option<usize>,
    observer: Option<TraceObserver>,
}

impl Agent {
    /// Create an agent talking to the configured OpenAI-compatible endpoint.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let index = match &config.search_data_path {
            Some(path) => FactIndex::load(path)?,
            None => FactIndex::default(),
        };
        let llm = Arc::new(OpenAiClient::from_config(config));
        Ok(Self::with_client(
            llm,
            ToolRegistry::with_search_index(index),
            config,
        ))
    }

    /// Create an agent over any client and tool set.
    pub fn with_client(llm: Arc<dyn LlmClient>, tools: ToolRegistry, config: &Config) -> Self {
        Self {
            llm,
            tools,
            rule: Arc::new(GrowthShareRule),
            model: config.default_model.clone(),
            model_timeout: config.model_timeout,
            max_iterations: config.max_iterations,
            observer: None,
        }
    }

    /// Replace the extraction rule used by plan execution.
    pub fn with_rule(mut self, rule: Arc<dyn ExtractionRule>) -> Self {
        self.rule = rule;
        self
    }

    /// Forward every trace entry to `observer` while a run is in progress.
    pub fn with_trace_observer(mut self, observer: TraceObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn new_trace(&self) -> Trace {
        Trace::observed(self.observer.clone())
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One model call, bounded by the configured timeout.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
        options: CompletionOptions,
    ) -> Result<ChatResponse, LlmError> {
        tokio::time::timeout(
            self.model_timeout,
            self.llm.chat_completion(&self.model, messages, tools, options),
        )
        .await
        .map_err(|_| LlmError::Timeout(self.model_timeout.as_secs()))?
    }
}
