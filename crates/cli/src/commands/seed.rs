//! `crabdesk seed` — Initialize the SQLite schema and seed the knowledge base.

use crabdesk_config::AppConfig;
use crabdesk_stores::{SqliteStores, seed_knowledge_base};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if config.store.backend != "sqlite" {
        return Err(format!(
            "seeding requires the sqlite backend (configured: '{}')",
            config.store.backend
        )
        .into());
    }

    // Opening the store runs the migrations.
    let stores = SqliteStores::new(&config.store.database_path).await?;
    let existing = crabdesk_core::store::KnowledgeStore::count(&stores).await?;
    if existing > 0 {
        println!(
            "Knowledge base already holds {existing} entries ({}); seeding again would duplicate them.",
            config.store.database_path
        );
        return Ok(());
    }

    let written = seed_knowledge_base(&stores).await?;
    println!("Seeded {written} knowledge base entries into {}", config.store.database_path);

    Ok(())
}
