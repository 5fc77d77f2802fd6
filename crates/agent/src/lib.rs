//! The Crabdesk agent core: plan once, execute sequentially.
//!
//! A customer message flows through exactly one planning call, plan
//! validation, and a single sequential execution pass. There is no
//! re-planning loop and no conversational memory beyond the request.

pub mod executor;
pub mod planner;
pub mod synthesizer;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use executor::{Executor, STATIC_FALLBACK_REPLY};
pub use planner::{PLANNING_FALLBACK_REPLY, Planner};
pub use synthesizer::Synthesizer;
pub use validate::parse_plan;

use crabdesk_core::error::AgentError;
use crabdesk_core::message::InboundMessage;
use crabdesk_core::trace::AgentReply;
use tracing::debug;

/// One-message support agent: planner plus executor behind a single call.
pub struct SupportAgent {
    planner: Planner,
    executor: Executor,
}

impl SupportAgent {
    pub fn new(planner: Planner, executor: Executor) -> Self {
        Self { planner, executor }
    }

    /// Handle a single inbound message end to end.
    ///
    /// Planning itself never fails (unusable oracle output degrades to a
    /// single apologetic reply); the only error path is a reply that can
    /// be neither written, synthesized, nor substituted.
    pub async fn handle(&self, message: &InboundMessage) -> Result<AgentReply, AgentError> {
        let plan = self.planner.plan(&message.text, &message.metadata).await;
        debug!(items = plan.len(), "Plan validated");
        self.executor.execute(plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SequentialMockOracle;
    use async_trait::async_trait;
    use crabdesk_core::error::{FetchError, OracleError};
    use crabdesk_core::fetch::{FetchResponse, Fetcher};
    use crabdesk_core::message::CustomerMetadata;
    use crabdesk_core::trace::SYNTHESIZE_ACTION;
    use crabdesk_core::TicketStore;
    use crabdesk_stores::{InMemoryStores, seed_knowledge_base};
    use std::sync::Arc;

    struct NoFetcher;

    #[async_trait]
    impl Fetcher for NoFetcher {
        async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
            Err(FetchError::DisallowedUrl(url.to_string()))
        }
    }

    async fn agent_with(oracle: SequentialMockOracle) -> (SupportAgent, Arc<InMemoryStores>) {
        let stores = Arc::new(InMemoryStores::new());
        seed_knowledge_base(stores.as_ref()).await.unwrap();

        let oracle: Arc<dyn crabdesk_core::oracle::Oracle> = Arc::new(oracle);
        let catalog = Arc::new(crabdesk_tools::standard_catalog());

        let planner = Planner::new(oracle.clone(), catalog, "mock-model");
        let executor = Executor::new(
            stores.clone(),
            stores.clone(),
            Arc::new(NoFetcher),
            Synthesizer::new(oracle, "mock-model"),
        );
        (SupportAgent::new(planner, executor), stores)
    }

    #[tokio::test]
    async fn return_policy_question_answered_from_knowledge_base() {
        let plan = r#"{"plan": [
            {"action": "search_kb", "reason": "policy lookup", "args": {"query": "return policy refund"}}
        ]}"#;
        let (agent, _) = agent_with(SequentialMockOracle::new(vec![
            Ok(plan.to_string()),
            Ok("You can return items within 30 days for a full refund.".to_string()),
        ]))
        .await;

        let reply = agent
            .handle(&InboundMessage::new("What is your return policy?"))
            .await
            .unwrap();

        assert_eq!(reply.final_text, "You can return items within 30 days for a full refund.");
        assert_eq!(reply.trace.len(), 2);
        assert_eq!(reply.trace[0].action, "search_kb");
        assert!(!reply.trace[0].is_error());
        assert_eq!(reply.trace[1].action, SYNTHESIZE_ACTION);
    }

    #[tokio::test]
    async fn escalation_creates_ticket_with_customer_identity() {
        let plan = r#"{"plan": [
            {"action": "create_ticket", "reason": "escalate", "args": {
                "customer_name": "Grace Hopper",
                "customer_email": "grace@example.com",
                "subject": "Damaged delivery",
                "body": "Package arrived crushed."
            }},
            {"action": "respond", "args": {"text": "We've opened a ticket and will follow up by email."}}
        ]}"#;
        let (agent, stores) = agent_with(SequentialMockOracle::new(vec![Ok(plan.to_string())])).await;

        let message = InboundMessage::new("My package arrived crushed, please help!")
            .with_metadata(CustomerMetadata {
                customer_name: Some("Grace Hopper".into()),
                customer_email: Some("grace@example.com".into()),
                session_id: None,
            });
        let reply = agent.handle(&message).await.unwrap();

        assert_eq!(reply.final_text, "We've opened a ticket and will follow up by email.");
        let open = stores.list_open().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].customer_email, "grace@example.com");
    }

    #[tokio::test]
    async fn unreachable_planner_degrades_to_apologetic_reply() {
        let (agent, _) = agent_with(SequentialMockOracle::new(vec![Err(OracleError::Network(
            "connection refused".into(),
        ))]))
        .await;

        let reply = agent.handle(&InboundMessage::new("hello?")).await.unwrap();
        assert_eq!(reply.final_text, PLANNING_FALLBACK_REPLY);
        assert_eq!(reply.trace.len(), 1);
        assert_eq!(reply.trace[0].action, "respond");
    }

    #[tokio::test]
    async fn garbage_plan_output_degrades_the_same_way() {
        let (agent, _) = agent_with(SequentialMockOracle::new(vec![Ok(
            "sure, here is some prose with no plan in it".to_string(),
        )]))
        .await;

        let reply = agent.handle(&InboundMessage::new("hi")).await.unwrap();
        assert_eq!(reply.final_text, PLANNING_FALLBACK_REPLY);
    }
}
