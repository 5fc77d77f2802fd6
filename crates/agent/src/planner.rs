//! Planning adapter — customer message in, validated `Plan` out.
//!
//! One oracle round-trip, no intrinsic retry (retry policy belongs to the
//! oracle collaborator, e.g. a fallback chain). Whatever comes back goes
//! through the plan validator; if the output is unusable the adapter
//! substitutes a single-step apology plan so the caller always receives
//! some plan, never an error.

use crabdesk_core::message::{ChatMessage, CustomerMetadata};
use crabdesk_core::oracle::{Oracle, OracleRequest};
use crabdesk_core::plan::Plan;
use crabdesk_core::tool::ToolCatalog;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::validate::parse_plan;

/// Reply text for the fallback plan when planning fails outright.
pub const PLANNING_FALLBACK_REPLY: &str = "I'm sorry, I wasn't able to work out the best way to \
     handle your request just now. Could you rephrase it, or share a few more details so I can help?";

const PLANNER_SYSTEM_PROMPT: &str = "You are an autonomous customer support planner. Given the \
     customer's message, produce a JSON object with a single key \"plan\" mapping to an array of \
     steps. Each step is an object with fields:\n\
     - \"action\": one of the available tool names\n\
     - \"args\": object with arguments for the action\n\
     - \"reason\": short explanation\n\
     Return only valid JSON.";

/// The planning adapter.
pub struct Planner {
    oracle: Arc<dyn Oracle>,
    catalog: Arc<ToolCatalog>,
    model: String,
    temperature: f32,
}

impl Planner {
    pub fn new(oracle: Arc<dyn Oracle>, catalog: Arc<ToolCatalog>, model: impl Into<String>) -> Self {
        Self {
            oracle,
            catalog,
            model: model.into(),
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the planning prompt. Deterministic for a given input: the
    /// same message, metadata, and catalog always produce the same text.
    fn build_prompt(&self, message: &str, metadata: &CustomerMetadata) -> Vec<ChatMessage> {
        let mut user = format!("Customer message: {message}\n");

        if !metadata.is_empty() {
            user.push_str("Customer metadata:\n");
            if let Some(name) = &metadata.customer_name {
                user.push_str(&format!("- name: {name}\n"));
            }
            if let Some(email) = &metadata.customer_email {
                user.push_str(&format!("- email: {email}\n"));
            }
            if let Some(session) = &metadata.session_id {
                user.push_str(&format!("- session: {session}\n"));
            }
        }

        user.push_str("\nAvailable tools:\n");
        user.push_str(&self.catalog.describe_for_prompt());

        vec![
            ChatMessage::system(PLANNER_SYSTEM_PROMPT),
            ChatMessage::user(user),
        ]
    }

    /// Produce a plan for one customer message.
    ///
    /// Never fails: oracle errors and malformed output both collapse into
    /// the single-step apology plan.
    pub async fn plan(&self, message: &str, metadata: &CustomerMetadata) -> Plan {
        let request = OracleRequest::new(self.model.clone(), self.build_prompt(message, metadata))
            .with_temperature(self.temperature);

        let raw = match self.oracle.complete(request).await {
            Ok(response) => response.text,
            Err(e) => {
                warn!(error = %e, "Planning oracle unreachable, using fallback plan");
                return fallback_plan();
            }
        };

        match parse_plan(&raw, &self.catalog) {
            Ok(plan) => {
                debug!(steps = plan.len(), "Plan validated");
                plan
            }
            Err(e) => {
                warn!(error = %e, "Planner produced malformed output, using fallback plan");
                fallback_plan()
            }
        }
    }
}

fn fallback_plan() -> Plan {
    Plan::single_response(PLANNING_FALLBACK_REPLY, "planning fallback")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SequentialMockOracle;
    use crabdesk_core::plan::{Action, PlanItem};

    fn catalog() -> Arc<ToolCatalog> {
        Arc::new(crabdesk_tools::standard_catalog())
    }

    fn metadata() -> CustomerMetadata {
        CustomerMetadata {
            customer_name: Some("Ada".into()),
            customer_email: Some("ada@example.com".into()),
            session_id: Some("s-1".into()),
        }
    }

    #[test]
    fn prompt_embeds_message_metadata_and_catalog() {
        let planner = Planner::new(
            Arc::new(SequentialMockOracle::single_text("{}")),
            catalog(),
            "mock-model",
        );
        let prompt = planner.build_prompt("Where is my order?", &metadata());
        assert_eq!(prompt.len(), 2);
        assert!(prompt[1].content.contains("Where is my order?"));
        assert!(prompt[1].content.contains("ada@example.com"));
        assert!(prompt[1].content.contains("search_kb"));
        assert!(prompt[1].content.contains("create_ticket"));
    }

    #[test]
    fn prompt_is_deterministic_for_same_input() {
        let planner = Planner::new(
            Arc::new(SequentialMockOracle::single_text("{}")),
            catalog(),
            "mock-model",
        );
        let a = planner.build_prompt("hello", &metadata());
        let b = planner.build_prompt("hello", &metadata());
        assert_eq!(a[1].content, b[1].content);
    }

    #[tokio::test]
    async fn valid_oracle_output_becomes_plan() {
        let oracle = SequentialMockOracle::single_text(
            r#"{"plan": [{"action": "search_kb", "args": {"query": "returns"}, "reason": "kb"}]}"#,
        );
        let planner = Planner::new(Arc::new(oracle), catalog(), "mock-model");
        let plan = planner.plan("What is your return policy?", &CustomerMetadata::default()).await;
        assert_eq!(plan.steps().count(), 1);
    }

    #[tokio::test]
    async fn malformed_output_yields_apology_plan() {
        let oracle = SequentialMockOracle::single_text("I refuse to answer in JSON.");
        let planner = Planner::new(Arc::new(oracle), catalog(), "mock-model");
        let plan = planner.plan("hello", &CustomerMetadata::default()).await;

        assert_eq!(plan.len(), 1);
        match &plan.items[0] {
            PlanItem::Step(step) => {
                assert!(matches!(&step.action, Action::Respond { text } if text == PLANNING_FALLBACK_REPLY));
            }
            PlanItem::Rejected(_) => panic!("fallback plan must be a respond step"),
        }
    }

    #[tokio::test]
    async fn oracle_failure_yields_apology_plan() {
        let oracle = SequentialMockOracle::always_failing();
        let planner = Planner::new(Arc::new(oracle), catalog(), "mock-model");
        let plan = planner.plan("hello", &CustomerMetadata::default()).await;
        assert_eq!(plan.len(), 1);
    }
}
