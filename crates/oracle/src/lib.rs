//! Oracle client implementations for Crabdesk.
//!
//! The agent treats its language-model dependency as an opaque,
//! unreliable collaborator behind the `Oracle` trait. This crate provides:
//! - `OpenAiCompatOracle` — HTTP client for any `/v1/chat/completions`
//!   endpoint (OpenAI, OpenRouter, Ollama, vLLM, ...)
//! - `FallbackOracle` — an ordered chain with per-entry timeouts; this is
//!   where retry policy lives, never in the planning adapter

pub mod fallback;
pub mod openai_compat;

pub use fallback::FallbackOracle;
pub use openai_compat::OpenAiCompatOracle;

use crabdesk_config::AppConfig;
use crabdesk_core::oracle::Oracle;
use std::sync::Arc;

/// Build the configured oracle.
///
/// A missing API key is not an error here — the client is constructed and
/// every call will fail with `NotConfigured`, which the agent absorbs via
/// its fallback paths.
pub fn from_config(config: &AppConfig) -> Arc<dyn Oracle> {
    let api_key = config.oracle.api_key.clone().unwrap_or_default();
    Arc::new(OpenAiCompatOracle::new(
        "openai_compat",
        config.oracle.base_url.clone(),
        api_key,
        std::time::Duration::from_secs(config.oracle.timeout_secs),
    ))
}
