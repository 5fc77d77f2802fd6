//! Oracle fallback — ordered retry chain with per-oracle timeouts.
//!
//! When an oracle fails (timeout, API error, network), the chain tries the
//! next entry. Retry policy belongs here: the planning adapter and the
//! synthesizer each make exactly one call against whatever oracle they are
//! handed.

use async_trait::async_trait;
use crabdesk_core::error::OracleError;
use crabdesk_core::oracle::{Oracle, OracleRequest, OracleResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// An oracle that wraps an ordered list of oracles and falls back on failure.
pub struct FallbackOracle {
    name: String,
    chain: Vec<FallbackEntry>,
}

struct FallbackEntry {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl FallbackOracle {
    /// Create a new fallback oracle with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Add an oracle to the chain with a custom timeout.
    pub fn add(mut self, oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        self.chain.push(FallbackEntry { oracle, timeout });
        self
    }

    /// Add an oracle with the default timeout (60s).
    pub fn add_default(self, oracle: Arc<dyn Oracle>) -> Self {
        self.add(oracle, Duration::from_secs(60))
    }

    /// Number of oracles in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait]
impl Oracle for FallbackOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: OracleRequest,
    ) -> std::result::Result<OracleResponse, OracleError> {
        let mut last_error = OracleError::NotConfigured("No oracles in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            let oracle_name = entry.oracle.name().to_string();

            info!(
                oracle = %oracle_name,
                attempt = i + 1,
                total = self.chain.len(),
                "Fallback: trying oracle"
            );

            match tokio::time::timeout(entry.timeout, entry.oracle.complete(request.clone())).await
            {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    warn!(oracle = %oracle_name, error = %e, "Fallback: oracle failed, trying next");
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        oracle = %oracle_name,
                        timeout_secs = entry.timeout.as_secs(),
                        "Fallback: oracle timed out, trying next"
                    );
                    last_error = OracleError::Timeout(format!(
                        "Oracle '{}' timed out after {}s",
                        oracle_name,
                        entry.timeout.as_secs()
                    ));
                }
            }
        }

        Err(last_error)
    }
}
