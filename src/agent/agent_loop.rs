//! Reactive mode: tools in a loop until the model answers in plain text.

use serde_json::Map;

use crate::llm::{CompletionOptions, ToolChoice};
use crate::tools::render_tool_output;

use super::trace::{Trace, TraceKind};
use super::transcript::Transcript;
use super::{Agent, AgentError};

/// Result of a reactive conversation.
#[derive(Debug, Clone)]
pub struct ConversationOutcome {
    /// Text of the model's final reply
    pub answer: String,

    /// The transcript, including the final reply, for the caller to keep
    pub transcript: Transcript,

    /// Tool calls and results as they happened
    pub trace: Trace,
}

impl Agent {
    /// Answer `user_input` with a fresh reactive transcript.
    pub async fn ask(&self, user_input: &str) -> Result<ConversationOutcome, AgentError> {
        self.run_conversation(Transcript::reactive(), user_input).await
    }

    /// Append `user_input` to `transcript` and loop until the model stops
    /// requesting tools.
    ///
    /// Tool-call arguments that fail to parse are replaced by an empty
    /// mapping; the loop never aborts on them. Without `MAX_ITERATIONS` the
    /// loop has no turn limit.
    pub async fn run_conversation(
        &self,
        mut transcript: Transcript,
        user_input: &str,
    ) -> Result<ConversationOutcome, AgentError> {
        let mut trace = self.new_trace();
        transcript.push_user(user_input);

        let tool_schemas = self.tools.tool_schemas();
        let options = CompletionOptions::default().with_tool_choice(ToolChoice::Auto);

        let mut turns = 0usize;
        loop {
            if let Some(max) = self.max_iterations {
                if turns >= max {
                    return Err(AgentError::IterationLimit(max));
                }
            }
            turns += 1;
            tracing::debug!("Reactive turn {}", turns);

            let response = self
                .complete(transcript.messages(), Some(&tool_schemas), options)
                .await?;

            if !response.has_tool_calls() {
                transcript.push_assistant(&response);
                let answer = response.content.unwrap_or_default();
                trace.record(TraceKind::FinalAnswer, answer.clone());
                return Ok(ConversationOutcome {
                    answer,
                    transcript,
                    trace,
                });
            }

            transcript.push_assistant(&response);

            for tool_call in &response.tool_calls {
                let args = tool_call.parse_arguments().unwrap_or_else(|e| {
                    tracing::warn!(
                        "Unusable arguments for {} ({}), continuing with none",
                        tool_call.name(),
                        e
                    );
                    Map::new()
                });

                tracing::info!("Agent decided to call tool: {} {:?}", tool_call.name(), args);
                trace.record(
                    TraceKind::ToolCall,
                    format!("{} {}", tool_call.name(), serde_json::Value::Object(args.clone())),
                );

                let result = self.tools.dispatch(tool_call.name(), &args).await;
                let rendered = render_tool_output(&result);
                tracing::info!("Tool result: {}", rendered);
                trace.record(TraceKind::ToolResult, rendered.clone());

                transcript.push_tool_result(tool_call, rendered)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::super::testing::{test_config, CannedTool, ScriptedLlm};
    use super::*;
    use crate::llm::{ChatMessage, ChatResponse, LlmError, ToolCall};
    use crate::tools::ToolRegistry;

    #[tokio::test]
    async fn tool_then_answer_yields_second_reply() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            ChatResponse::tool_call(ToolCall::new(
                "call_1",
                "calculate",
                r#"{"expression": "6 * 7"}"#,
            )),
            ChatResponse::text("The answer is 42."),
        ]));
        let agent = Agent::with_client(llm.clone(), ToolRegistry::new(), &test_config());

        let outcome = agent.ask("What is 6 times 7?").await.expect("conversation");

        assert_eq!(outcome.answer, "The answer is 42.");
        assert_eq!(outcome.transcript.tool_messages().count(), 1);
        assert_eq!(
            outcome.transcript.tool_messages().next(),
            Some(&ChatMessage::Tool {
                tool_call_id: "call_1".to_string(),
                content: "42".to_string(),
            })
        );
        assert_eq!(
            outcome.transcript.last(),
            Some(&ChatMessage::assistant("The answer is 42."))
        );

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].with_tools);
        assert_eq!(requests[0].options.tool_choice, Some(ToolChoice::Auto));
        assert_eq!(requests[0].options.temperature, None);
        // system, user, assistant(tool call), tool
        assert_eq!(requests[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn malformed_arguments_dispatch_with_empty_mapping() {
        let calc = CannedTool::new("calculate", json!("0"));
        let llm = Arc::new(ScriptedLlm::new(vec![
            ChatResponse::tool_call(ToolCall::new("call_1", "calculate", "{not valid json")),
            ChatResponse::text("I could not compute that."),
        ]));
        let tools = ToolRegistry::empty().with_tool(calc.clone());
        let agent = Agent::with_client(llm, tools, &test_config());

        let outcome = agent.ask("What is 2 + 2?").await.expect("must not raise");

        assert_eq!(calc.calls(), vec![Map::new()]);
        assert_eq!(outcome.answer, "I could not compute that.");
    }

    #[tokio::test]
    async fn unknown_tool_result_is_fed_back() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            ChatResponse::tool_call(ToolCall::new("call_1", "weather", "{}")),
            ChatResponse::text("No weather tool."),
        ]));
        let agent = Agent::with_client(llm.clone(), ToolRegistry::new(), &test_config());

        agent.ask("Weather?").await.expect("conversation");

        let second = &llm.requests()[1];
        assert_eq!(
            second.messages.last().and_then(ChatMessage::content),
            Some(r#"{"error":"Unknown tool"}"#)
        );
    }

    #[tokio::test]
    async fn every_tool_call_in_a_turn_gets_a_result() {
        let response = ChatResponse {
            content: None,
            tool_calls: vec![
                ToolCall::new("a", "calculate", r#"{"expression": "1 + 1"}"#),
                ToolCall::new("b", "calculate", r#"{"expression": "2 + 2"}"#),
            ],
        };
        let llm = Arc::new(ScriptedLlm::new(vec![response, ChatResponse::text("2 and 4")]));
        let agent = Agent::with_client(llm, ToolRegistry::new(), &test_config());

        let outcome = agent.ask("Two sums").await.expect("conversation");

        let results: Vec<Option<&str>> = outcome
            .transcript
            .tool_messages()
            .map(ChatMessage::content)
            .collect();
        assert_eq!(results, vec![Some("2"), Some("4")]);
        assert_eq!(outcome.trace.count(TraceKind::ToolCall), 2);
    }

    #[tokio::test]
    async fn transcript_carries_over_between_runs() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            ChatResponse::text("Hello."),
            ChatResponse::text("Still here."),
        ]));
        let agent = Agent::with_client(llm.clone(), ToolRegistry::new(), &test_config());

        let first = agent.ask("Hi").await.expect("first");
        let second = agent
            .run_conversation(first.transcript, "Are you there?")
            .await
            .expect("second");

        assert_eq!(second.answer, "Still here.");
        // system, user, assistant, user, assistant
        assert_eq!(second.transcript.len(), 5);
        // a fresh run starts clean
        let fresh = Transcript::reactive();
        assert_eq!(fresh.len(), 1);
    }

    #[tokio::test]
    async fn iteration_cap_stops_endless_tool_requests() {
        let calls = (0..5)
            .map(|i| {
                ChatResponse::tool_call(ToolCall::new(
                    format!("call_{}", i),
                    "calculate",
                    r#"{"expression": "1"}"#,
                ))
            })
            .collect();
        let llm = Arc::new(ScriptedLlm::new(calls));
        let mut config = test_config();
        config.max_iterations = Some(3);
        let agent = Agent::with_client(llm.clone(), ToolRegistry::new(), &config);

        let err = agent.ask("loop forever").await.expect_err("capped");
        assert!(matches!(err, AgentError::IterationLimit(3)));
        assert_eq!(llm.remaining(), 2);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let llm = Arc::new(ScriptedLlm::with_results(vec![Err(LlmError::Api {
            status: 401,
            body: "invalid key".to_string(),
        })]));
        let agent = Agent::with_client(llm, ToolRegistry::new(), &test_config());

        let err = agent.ask("hi").await.expect_err("should fail");
        assert!(matches!(err, AgentError::Llm(LlmError::Api { status: 401, .. })));
    }
}
