//! Plan model — the typed output of the planning step.
//!
//! A plan is an ordered list of steps over a closed action set. The
//! original oracle output dispatches on raw strings; here anything outside
//! the fixed union is rejected at the validation boundary and carried as a
//! `RejectedStep` marker, so the executor's dispatch is an exhaustive
//! match over well-typed actions and rejected steps still surface in the
//! trace in plan order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of actions the executor can dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    SearchKb {
        query: String,
        top_k: usize,
    },
    CreateTicket {
        customer_name: String,
        customer_email: String,
        subject: String,
        body: String,
    },
    HttpGet {
        url: String,
    },
    Respond {
        text: String,
    },
}

impl Action {
    /// The action's registry name, as it appears in traces.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SearchKb { .. } => "search_kb",
            Action::CreateTicket { .. } => "create_ticket",
            Action::HttpGet { .. } => "http_get",
            Action::Respond { .. } => "respond",
        }
    }
}

/// A validated plan step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// The typed action to dispatch
    pub action: Action,

    /// The planner's free-text justification ("" when absent)
    #[serde(default)]
    pub reason: String,

    /// The raw arguments as the planner emitted them, kept for the trace
    #[serde(default)]
    pub raw_args: Value,
}

impl PlanStep {
    pub fn new(action: Action) -> Self {
        let raw_args = serde_json::to_value(&action)
            .map(|mut v| {
                // The tag field duplicates the action name; traces carry it separately.
                if let Some(obj) = v.as_object_mut() {
                    obj.remove("action");
                }
                v
            })
            .unwrap_or(Value::Null);
        Self {
            action,
            reason: String::new(),
            raw_args,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// A step that failed validation: unknown action name or missing required
/// arguments. Kept in plan order so the executor records it as a failed
/// trace entry rather than silently dropping it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedStep {
    /// The action name as the planner wrote it
    pub action: String,

    /// The planner's justification ("" when absent)
    #[serde(default)]
    pub reason: String,

    /// The raw arguments as emitted
    #[serde(default)]
    pub raw_args: Value,

    /// Why the step was rejected (e.g. "unknown_action", "ticket_creation_failed")
    pub error: String,
}

/// One item in a plan: either a dispatchable step or a rejection marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanItem {
    Step(PlanStep),
    Rejected(RejectedStep),
}

/// An ordered plan for one customer message.
///
/// Ordering is exactly as the oracle emitted it; the validator never
/// reorders or deduplicates. Repeated identical steps execute repeatedly —
/// duplicate ticket creation is an accepted risk, not auto-deduplicated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub items: Vec<PlanItem>,
}

impl Plan {
    pub fn new(items: Vec<PlanItem>) -> Self {
        Self { items }
    }

    /// A plan holding a single `respond` step — used as the planning
    /// adapter's fallback when the oracle output is unusable.
    pub fn single_response(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            items: vec![PlanItem::Step(
                PlanStep::new(Action::Respond { text: text.into() }).with_reason(reason),
            )],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate only the dispatchable steps.
    pub fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.items.iter().filter_map(|i| match i {
            PlanItem::Step(s) => Some(s),
            PlanItem::Rejected(_) => None,
        })
    }
}
