//! Plan generation and parsing.

use crate::llm::{ChatMessage, CompletionOptions};

use super::prompt::build_planner_prompt;
use super::{Agent, AgentError};

impl Agent {
    /// Ask the model for a numbered plan for `task`.
    ///
    /// One call, no tools, temperature 0. The raw text is returned as-is;
    /// its format is not checked here.
    pub async fn create_plan(&self, task: &str) -> Result<String, AgentError> {
        let messages = [ChatMessage::user(build_planner_prompt(task))];
        let options = CompletionOptions::default().with_temperature(0.0);

        let response = self.complete(&messages, None, options).await?;
        Ok(response.content.unwrap_or_default())
    }
}

/// Turn planner text into steps.
///
/// Keeps lines whose trimmed form starts with a numeric character (any
/// Unicode digit, so `١.` or `².` count too) and drops everything up to and
/// including the first `.` on them. Numbering is not checked.
pub fn parse_plan(plan_text: &str) -> Vec<String> {
    plan_text
        .split('\n')
        .map(str::trim)
        .filter(|line| line.starts_with(char::is_numeric))
        .map(|line| match line.split_once('.') {
            Some((_, rest)) => rest.trim().to_string(),
            None => line.to_string(),
        })
        .collect()
}
