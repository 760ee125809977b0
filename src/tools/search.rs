//! Information lookup tool backed by a keyword fact index.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{required_str, Tool};

/// One searchable fact: every keyword must appear in the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub keywords: Vec<String>,
    pub data: Value,
}

/// Facts the `search` tool answers from.
#[derive(Debug, Clone, PartialEq)]
pub struct FactIndex {
    facts: Vec<Fact>,
}

impl Default for FactIndex {
    fn default() -> Self {
        Self::new(vec![Fact {
            keywords: vec!["india".into(), "gdp".into(), "growth".into()],
            data: json!({"gdp_growth": 7}),
        }])
    }
}

impl FactIndex {
    pub fn new(facts: Vec<Fact>) -> Self {
        let facts = facts
            .into_iter()
            .map(|f| Fact {
                keywords: f.keywords.iter().map(|k| k.to_lowercase()).collect(),
                data: f.data,
            })
            .collect();
        Self { facts }
    }

    /// Load a JSON array of `{"keywords": [...], "data": ...}` entries.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let facts: Vec<Fact> = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid fact file {}: {}", path.display(), e))?;
        Ok(Self::new(facts))
    }

    /// Best fully-matching fact: the one with the most keywords wins, ties go
    /// to the earlier entry.
    pub fn lookup(&self, query: &str) -> Option<&Fact> {
        let words = query_words(query);
        let mut best: Option<&Fact> = None;
        for fact in &self.facts {
            if fact.keywords.is_empty() || !fact.keywords.iter().all(|k| words.contains(k)) {
                continue;
            }
            if best.map_or(true, |b| fact.keywords.len() > b.keywords.len()) {
                best = Some(fact);
            }
        }
        best
    }
}

fn query_words(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Answer a query from the fact index, as JSON text when something matches.
pub struct Search {
    index: FactIndex,
}

impl Search {
    pub fn new(index: FactIndex) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for Search {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search for information"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: &Map<String, Value>) -> anyhow::Result<Value> {
        let query = required_str(args, "query")?;

        match self.index.lookup(query) {
            Some(fact) => Ok(Value::String(fact.data.to_string())),
            None => Ok(Value::String(format!("No results found for: {}", query))),
        }
    }
}
