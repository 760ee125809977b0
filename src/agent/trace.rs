//! Execution trace returned alongside every answer.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// A single entry in the execution trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Entry type
    pub kind: TraceKind,

    /// Content of the entry
    pub content: String,
}

/// Types of trace entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// Raw planner output
    Plan,
    /// A plan step is starting
    Step,
    /// Tool is being called
    ToolCall,
    /// Tool returned a result
    ToolResult,
    /// A value was written to run state
    StateStored,
    /// Model answered a step without a tool
    StepResult,
    /// The run produced its answer
    FinalAnswer,
}

/// Callback invoked with each entry as soon as it is recorded.
#[derive(Clone)]
pub struct TraceObserver(Arc<dyn Fn(&TraceEntry) + Send + Sync>);

impl TraceObserver {
    pub fn new(f: impl Fn(&TraceEntry) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for TraceObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TraceObserver")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Trace {
    entries: Vec<TraceEntry>,
    #[serde(skip)]
    observer: Option<TraceObserver>,
}

impl Trace {
    /// Trace that also forwards every entry to `observer`.
    pub fn observed(observer: Option<TraceObserver>) -> Self {
        Self {
            entries: Vec::new(),
            observer,
        }
    }

    pub fn record(&mut self, kind: TraceKind, content: impl Into<String>) {
        let entry = TraceEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind,
            content: content.into(),
        };
        if let Some(TraceObserver(notify)) = &self.observer {
            notify(&entry);
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn count(&self, kind: TraceKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}
