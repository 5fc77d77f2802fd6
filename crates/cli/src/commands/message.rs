//! `crabdesk message` — One-shot agent invocation.

use crabdesk_config::AppConfig;
use crabdesk_core::message::{CustomerMetadata, InboundMessage};

pub async fn run(
    text: String,
    name: Option<String>,
    email: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let wiring = super::build_wiring(&config).await?;

    let message = InboundMessage::new(text).with_metadata(CustomerMetadata {
        customer_name: name,
        customer_email: email,
        session_id: None,
    });

    let reply = wiring.agent.handle(&message).await?;

    println!("{}", reply.final_text);
    println!();
    println!("Trace ({} entries):", reply.trace.len());
    println!("{}", serde_json::to_string_pretty(&reply.trace)?);

    Ok(())
}
