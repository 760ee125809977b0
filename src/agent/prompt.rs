//! Prompt templates for the agent.

/// System prompt for reactive mode.
pub const REACTIVE_SYSTEM_PROMPT: &str = r#"You are an execution agent.

Rules:
- Use tool outputs carefully.
- If tool returns JSON, extract numeric values.
- Never invent variables like GDP.
- Always use concrete numeric expressions."#;

/// System prompt seeding every plan execution.
pub const EXECUTOR_SYSTEM_PROMPT: &str = "You must ONLY use numeric values explicitly returned by tools. Do not invent, approximate, or modify numeric values. If tool says 7, use 7.";

/// Build the planner prompt with the task embedded verbatim.
pub fn build_planner_prompt(task: &str) -> String {
    format!(
        r#"You are a strict planning agent.

ORIGINAL USER TASK:
"""{task}"""

Rules:
- You MUST preserve the exact meaning of the original task.
- Do NOT change terminology.
- If the task says "GDP growth", you must use "GDP growth".
- Do NOT replace it with "GDP".
- Do NOT broaden or reinterpret the objective.
- Create only minimal executable steps required to complete this exact task.

Return only numbered steps."#,
        task = task
    )
}
