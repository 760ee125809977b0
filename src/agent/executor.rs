//! Plan-execute mode: run each plan step against the tool-calling model.
//!
//! # Algorithm
//! 1. Get a plan from the planner and parse it into steps
//! 2. Seed a transcript with the executor system prompt
//! 3. For each step: add it as a user message and call the model with tools
//! 4. Dispatch tool calls; when the extraction rule captures a value, store
//!    it, compute the derived answer with `calculate`, and stop
//! 5. Otherwise carry the raw tool result forward as an assistant message
//! 6. If no step short-circuits, answer with the last message's content

use serde_json::{json, Map, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::llm::{ChatMessage, CompletionOptions, ToolCall, ToolChoice};
use crate::tools::render_tool_output;

use super::extraction::{Extraction, State};
use super::prompt::EXECUTOR_SYSTEM_PROMPT;
use super::trace::{Trace, TraceKind};
use super::transcript::Transcript;
use super::{Agent, AgentError};

/// Result of a plan execution.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Identifier of this run (also on the tracing span)
    pub run_id: Uuid,

    /// Raw planner output
    pub plan_text: String,

    /// Steps parsed from the plan
    pub steps: Vec<String>,

    /// Final answer text
    pub answer: String,

    /// Whether the extraction rule produced the answer
    pub short_circuited: bool,

    /// Values captured from tool output
    pub state: State,

    /// Execution context as sent to the model
    pub transcript: Transcript,

    /// Plan, steps, tool calls and results as they happened
    pub trace: Trace,
}

/// What handling one tool call led to.
enum CallOutcome {
    Continue,
    Answered(String),
}

impl Agent {
    /// Plan `task`, then execute the plan step by step.
    ///
    /// Malformed tool-call arguments abort the run with
    /// [`AgentError::MalformedToolArguments`].
    pub async fn execute_plan(&self, task: &str) -> Result<PlanOutcome, AgentError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("plan_run", %run_id);
        self.execute_plan_inner(run_id, task).instrument(span).await
    }

    async fn execute_plan_inner(
        &self,
        run_id: Uuid,
        task: &str,
    ) -> Result<PlanOutcome, AgentError> {
        let mut trace = self.new_trace();

        let plan_text = self.create_plan(task).await?;
        tracing::info!("Plan:\n{}", plan_text);
        trace.record(TraceKind::Plan, plan_text.clone());

        let steps = super::parse_plan(&plan_text);
        tracing::debug!("Parsed {} steps", steps.len());

        let mut state = State::default();
        let mut transcript = Transcript::with_system(EXECUTOR_SYSTEM_PROMPT);

        let tool_schemas = self.tools.tool_schemas();
        let options = CompletionOptions::default()
            .with_tool_choice(ToolChoice::Auto)
            .with_temperature(0.0);

        for (index, step) in steps.iter().enumerate() {
            tracing::info!("Executing step {}: {}", index + 1, step);
            trace.record(TraceKind::Step, step.clone());
            transcript.push_user(step.clone());

            let response = self
                .complete(transcript.messages(), Some(&tool_schemas), options)
                .await?;

            if !response.has_tool_calls() {
                transcript.push_assistant(&response);
                let content = response.content.unwrap_or_default();
                tracing::info!("Step result: {}", content);
                trace.record(TraceKind::StepResult, content);
                continue;
            }

            for tool_call in &response.tool_calls {
                let outcome = self
                    .handle_step_tool_call(tool_call, &mut state, &mut transcript, &mut trace)
                    .await?;

                if let CallOutcome::Answered(answer) = outcome {
                    trace.record(TraceKind::FinalAnswer, answer.clone());
                    return Ok(PlanOutcome {
                        run_id,
                        plan_text,
                        steps,
                        answer,
                        short_circuited: true,
                        state,
                        transcript,
                        trace,
                    });
                }
            }
        }

        let answer = transcript.last_content();
        trace.record(TraceKind::FinalAnswer, answer.clone());
        Ok(PlanOutcome {
            run_id,
            plan_text,
            steps,
            answer,
            short_circuited: false,
            state,
            transcript,
            trace,
        })
    }

    async fn handle_step_tool_call(
        &self,
        tool_call: &ToolCall,
        state: &mut State,
        transcript: &mut Transcript,
        trace: &mut Trace,
    ) -> Result<CallOutcome, AgentError> {
        let name = tool_call.name();
        let args = tool_call
            .parse_arguments()
            .map_err(|source| AgentError::MalformedToolArguments {
                tool: name.to_string(),
                source,
            })?;

        tracing::info!("Tool call: {} {:?}", name, args);
        trace.record(
            TraceKind::ToolCall,
            format!("{} {}", name, Value::Object(args.clone())),
        );

        let result = self.tools.dispatch(name, &args).await;
        let rendered = render_tool_output(&result);
        tracing::info!("Tool result: {}", rendered);
        trace.record(TraceKind::ToolResult, rendered.clone());

        match self.rule.extract(name, &result) {
            Extraction::Extracted(captured) => {
                let key = self.rule.state_key().to_string();
                tracing::info!("Stored in state: {} = {}", key, captured);
                trace.record(TraceKind::StateStored, format!("{} = {}", key, captured));
                state.record(key, captured.clone());

                let expression = self.rule.derived_expression(&captured);
                let mut calc_args = Map::new();
                calc_args.insert("expression".to_string(), json!(expression));
                let computed = self.tools.dispatch("calculate", &calc_args).await;
                tracing::info!("Derived {} = {}", expression, render_tool_output(&computed));
                state.record("result", computed.clone());

                Ok(CallOutcome::Answered(
                    self.rule.final_answer(&captured, &computed),
                ))
            }
            Extraction::NotApplicable => {
                transcript.push(ChatMessage::assistant(rendered))?;
                Ok(CallOutcome::Continue)
            }
            Extraction::Malformed(reason) => {
                tracing::debug!("Tool result from {} not usable as state: {}", name, reason);
                transcript.push(ChatMessage::assistant(rendered))?;
                Ok(CallOutcome::Continue)
            }
        }
    }
}
