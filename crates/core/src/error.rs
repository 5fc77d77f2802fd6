//! Error types for the Crabdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Crabdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Oracle errors ---
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Fetch errors ---
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    // --- Plan errors ---
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    // --- Agent errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to a language-model oracle (planning or synthesis).
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Oracle not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed oracle response: {0}")]
    Malformed(String),
}

/// Failures against the knowledge or ticket store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Failures of the restricted external-fetch collaborator.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("URL not allowed by fetch policy: {0}")]
    DisallowedUrl(String),

    #[error("Fetch timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),
}

/// The planning oracle's output could not be shaped into a plan.
///
/// This is a hard failure with no partial credit: if no plan array can be
/// extracted at all, the whole response is rejected. Per-step problems
/// (unknown action, missing required argument) are NOT plan errors — they
/// become rejected steps inside an otherwise valid plan.
#[derive(Debug, Clone, Error)]
pub enum PlanError {
    #[error("Malformed plan: {0}")]
    Malformed(String),
}

/// Request-level agent failures.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// No step produced explicit reply text, synthesis was unreachable,
    /// and the static fallback reply is disabled by configuration.
    /// The one error the transport layer maps to a server error.
    #[error("No reply available: synthesis failed and static fallback is disabled ({0})")]
    NoReplyAvailable(String),
}
