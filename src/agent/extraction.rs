//! Run state and the rule that lifts values out of tool results.
//!
//! The executor asks an [`ExtractionRule`] about every tool result. When the
//! rule extracts a value, the executor stores it, evaluates the rule's derived
//! expression with `calculate`, and answers immediately.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::tools::render_tool_output;

/// Run-scoped key/value store, written only from parsed tool output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    values: BTreeMap<String, Value>,
}

impl State {
    pub(crate) fn record(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of inspecting one tool result.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Extracted(Value),
    NotApplicable,
    Malformed(String),
}

/// Decides which tool results feed state and how the answer is derived.
pub trait ExtractionRule: Send + Sync {
    /// State key the extracted value is stored under.
    fn state_key(&self) -> &str;

    fn extract(&self, tool_name: &str, result: &Value) -> Extraction;

    /// Expression handed to `calculate` once a value was extracted.
    fn derived_expression(&self, captured: &Value) -> String;

    fn final_answer(&self, captured: &Value, computed: &Value) -> String;
}

/// `search` results carrying `gdp_growth`; answer is 18% of that figure.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowthShareRule;

impl GrowthShareRule {
    pub const SOURCE_TOOL: &'static str = "search";
    pub const FIELD: &'static str = "gdp_growth";
    pub const MULTIPLIER: &'static str = "0.18";
}

impl ExtractionRule for GrowthShareRule {
    fn state_key(&self) -> &str {
        Self::FIELD
    }

    fn extract(&self, tool_name: &str, result: &Value) -> Extraction {
        if tool_name != Self::SOURCE_TOOL {
            return Extraction::NotApplicable;
        }

        let text = render_tool_output(result);
        let parsed: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => return Extraction::Malformed(e.to_string()),
        };

        match parsed.get(Self::FIELD) {
            None => Extraction::NotApplicable,
            Some(v @ (Value::Number(_) | Value::String(_))) => Extraction::Extracted(v.clone()),
            Some(other) => {
                Extraction::Malformed(format!("{} is not a scalar: {}", Self::FIELD, other))
            }
        }
    }

    fn derived_expression(&self, captured: &Value) -> String {
        format!("{} * {}", render_tool_output(captured), Self::MULTIPLIER)
    }

    fn final_answer(&self, captured: &Value, computed: &Value) -> String {
        format!(
            "18% of India's GDP growth ({}%) is {}%.",
            render_tool_output(captured),
            render_tool_output(computed)
        )
    }
}
