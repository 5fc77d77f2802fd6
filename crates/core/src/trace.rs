//! Execution trace — the append-only log of what the executor did.
//!
//! One entry per executed (or rejected) step, in execution order, plus at
//! most one synthetic entry when the reply was synthesized from the trace
//! rather than written by an explicit `respond` step.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved action tag for the synthesis entry, distinct from every
/// registered tool name so callers can tell an explicit reply from a
/// synthesized one.
pub const SYNTHESIZE_ACTION: &str = "synthesize_reply";

/// One entry in the execution trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Action name (a registry name, or `synthesize_reply`)
    pub action: String,

    /// The planner's justification for the step
    #[serde(default)]
    pub reason: String,

    /// Arguments as the planner emitted them
    #[serde(default)]
    pub args: Value,

    /// Step result on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error description on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceEntry {
    pub fn success(action: impl Into<String>, reason: impl Into<String>, args: Value, result: Value) -> Self {
        Self {
            action: action.into(),
            reason: reason.into(),
            args,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(action: impl Into<String>, reason: impl Into<String>, args: Value, error: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            reason: reason.into(),
            args,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// The unit returned to the caller for one message: final prose plus the
/// full execution trace. No identity beyond the request lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub final_text: String,
    pub trace: Vec<TraceEntry>,
}
