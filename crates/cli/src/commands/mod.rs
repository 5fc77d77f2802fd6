pub mod message;
pub mod seed;
pub mod serve;
pub mod status;

use crabdesk_agent::{Executor, Planner, Synthesizer, SupportAgent};
use crabdesk_config::AppConfig;
use crabdesk_core::store::{KnowledgeStore, TicketStore};
use crabdesk_stores::{InMemoryStores, SqliteStores, seed_knowledge_base};
use crabdesk_tools::HttpFetcher;
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs to run the agent or touch the stores.
pub struct Wiring {
    pub agent: Arc<SupportAgent>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub tickets: Arc<dyn TicketStore>,
}

/// Build the store backends named by the config.
///
/// An in-memory backend starts seeded; it holds nothing from previous runs.
pub async fn build_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn KnowledgeStore>, Arc<dyn TicketStore>), Box<dyn std::error::Error>> {
    match config.store.backend.as_str() {
        "sqlite" => {
            let stores = Arc::new(SqliteStores::new(&config.store.database_path).await?);
            Ok((stores.clone(), stores))
        }
        "in_memory" => {
            let stores = Arc::new(InMemoryStores::new());
            seed_knowledge_base(stores.as_ref()).await?;
            Ok((stores.clone(), stores))
        }
        other => Err(format!("unknown store backend '{other}'").into()),
    }
}

/// Wire the full agent from config: oracle, stores, catalog, planner,
/// executor.
pub async fn build_wiring(config: &AppConfig) -> Result<Wiring, Box<dyn std::error::Error>> {
    let (knowledge, tickets) = build_stores(config).await?;

    let oracle = crabdesk_oracle::from_config(config);
    let catalog = Arc::new(crabdesk_tools::standard_catalog());
    let fetcher = Arc::new(HttpFetcher::from_config(&config.fetch));

    let planner = Planner::new(oracle.clone(), catalog, config.oracle.model.clone())
        .with_temperature(config.oracle.temperature);
    let synthesizer = Synthesizer::new(oracle, config.oracle.synthesis_model().to_string());
    let executor = Executor::new(knowledge.clone(), tickets.clone(), fetcher, synthesizer)
        .with_tool_timeout(Duration::from_secs(config.agent.tool_timeout_secs))
        .with_static_fallback(config.agent.static_fallback_reply);

    Ok(Wiring {
        agent: Arc::new(SupportAgent::new(planner, executor)),
        knowledge,
        tickets,
    })
}
