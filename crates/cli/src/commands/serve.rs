//! `crabdesk serve` — Start the HTTP gateway.

use crabdesk_config::AppConfig;
use crabdesk_gateway::AppState;
use std::sync::Arc;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    if !config.has_api_key() {
        eprintln!("WARNING: no API key configured; planning will degrade to fallback replies.");
        eprintln!("Set CRABDESK_API_KEY or OPENAI_API_KEY, or add oracle.api_key to the config.");
    }

    println!("Crabdesk Gateway");
    println!("  Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("  Store:     {} ({})", config.store.backend, config.store.database_path);
    println!("  Model:     {}", config.oracle.model);

    let wiring = super::build_wiring(&config).await?;
    let state = Arc::new(AppState {
        agent: wiring.agent,
        knowledge: wiring.knowledge,
        tickets: wiring.tickets,
    });

    crabdesk_gateway::start(&config.gateway, state).await?;

    Ok(())
}
