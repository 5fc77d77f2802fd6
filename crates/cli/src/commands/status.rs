//! `crabdesk status` — Show configuration and store counts.

use crabdesk_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Crabdesk Status");
    println!("===============");
    println!("  Config dir:  {}", AppConfig::config_dir().display());
    println!("  Base URL:    {}", config.oracle.base_url);
    println!("  Model:       {}", config.oracle.model);
    println!("  Synthesis:   {}", config.oracle.synthesis_model());
    println!("  Temperature: {}", config.oracle.temperature);
    println!("  API key:     {}", if config.has_api_key() { "configured" } else { "missing" });
    println!("  Store:       {} ({})", config.store.backend, config.store.database_path);
    println!("  Gateway:     {}:{}", config.gateway.host, config.gateway.port);
    println!("  Fallback:    {}", if config.agent.static_fallback_reply { "static reply" } else { "hard error" });

    if config.store.backend == "sqlite" && std::path::Path::new(&config.store.database_path).exists() {
        let (knowledge, tickets) = super::build_stores(&config).await?;
        let kb_entries = knowledge.count().await?;
        let open_tickets = tickets.list_open().await?.len();
        println!();
        println!("  KB entries:   {kb_entries}");
        println!("  Open tickets: {open_tickets}");
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!();
        println!("  No config file at {} — create one from these defaults:", config_path.display());
        println!();
        println!("{}", AppConfig::default_toml());
    }

    Ok(())
}
