//! Tools the model can call, and the dispatcher that routes calls to them.

mod calculate;
mod search;

pub use calculate::{evaluate, CalcError, Calculate};
pub use search::{FactIndex, Search};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// A tool that can be invoked by name with JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Errors are reported back to the model, not raised.
    async fn execute(&self, args: &Map<String, Value>) -> anyhow::Result<Value>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Ordered set of tools plus name-based dispatch.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the default `calculate` and `search` tools.
    pub fn new() -> Self {
        Self::with_search_index(FactIndex::default())
    }

    /// Default tools, with `search` answering from `index`.
    pub fn with_search_index(index: FactIndex) -> Self {
        Self::empty()
            .with_tool(Arc::new(Calculate))
            .with_tool(Arc::new(Search::new(index)))
    }

    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool; a later tool with the same name replaces the earlier one.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
        self
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Function-tool schemas in OpenAI format.
    pub fn tool_schemas(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters_schema()
                    }
                })
            })
            .collect()
    }

    /// Run the tool called `name`.
    ///
    /// Never fails: an unknown name yields `{"error": "Unknown tool"}` and a
    /// failing tool yields `{"error": "<message>"}`.
    pub async fn dispatch(&self, name: &str, args: &Map<String, Value>) -> Value {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            tracing::warn!("Model requested unknown tool: {}", name);
            return json!({"error": "Unknown tool"});
        };

        match tool.execute(args).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                json!({"error": e.to_string()})
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Text form of a tool result as it goes into a transcript.
pub fn render_tool_output(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> anyhow::Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}
