//! Fetcher trait — the restricted external-fetch collaborator.
//!
//! `http_get` steps go through this boundary. Implementations enforce a
//! scheme/host allow-list and a bounded timeout; the call must never be
//! allowed to block indefinitely.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A fetched response, body truncated by the implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body, truncated to the implementation's cap
    pub body: String,

    /// Content-Type header when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// External fetch collaborator.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a URL under the fetch policy.
    async fn get(&self, url: &str) -> std::result::Result<FetchResponse, FetchError>;
}
