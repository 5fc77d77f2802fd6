//! Restricted HTTP fetcher — the collaborator behind the `http_get` tool.
//!
//! Policy:
//! - `http`/`https` schemes only
//! - loopback, link-local, and cloud-metadata hosts are refused unless
//!   explicitly allow-listed
//! - a non-empty allow-list restricts fetches to those hosts (exact match
//!   or subdomain)
//! - bounded timeout; a slow upstream yields `FetchError::Timeout`, never
//!   an unbounded wait
//! - response bodies truncated to 4 KiB

use async_trait::async_trait;
use crabdesk_config::FetchConfig;
use crabdesk_core::error::FetchError;
use crabdesk_core::fetch::{FetchResponse, Fetcher};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum bytes of response body kept.
const MAX_BODY_BYTES: usize = 4096;

/// Hosts that are never fetched implicitly.
const BLOCKED_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1", "169.254.169.254", "metadata.google.internal"];

/// A real HTTP fetcher with URL policy enforcement.
pub struct HttpFetcher {
    allowed_hosts: Vec<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(allowed_hosts: Vec<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("crabdesk/0.1")
            .build()
            .unwrap_or_default();

        Self {
            allowed_hosts,
            timeout,
            client,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.allowed_hosts.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Check a URL against the fetch policy. Returns the reason for
    /// refusal, if any.
    fn check_policy(&self, url: &str) -> Result<(), String> {
        let parsed = reqwest::Url::parse(url).map_err(|e| format!("invalid URL: {e}"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("scheme '{}' not allowed", parsed.scheme()));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| "URL has no host".to_string())?
            .to_lowercase();

        let explicitly_allowed = self
            .allowed_hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")));

        if BLOCKED_HOSTS.contains(&host.as_str()) && !explicitly_allowed {
            return Err(format!("host '{host}' is blocked"));
        }

        if !self.allowed_hosts.is_empty() && !explicitly_allowed {
            return Err(format!("host '{host}' is not on the allow list"));
        }

        Ok(())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.check_policy(url).map_err(|reason| {
            warn!(url, %reason, "Fetch refused by policy");
            FetchError::DisallowedUrl(reason)
        })?;

        debug!(url, "Fetching external resource");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout.as_secs())
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout.as_secs())
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let truncated = if body.len() > MAX_BODY_BYTES {
            let mut end = MAX_BODY_BYTES;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body[..end].to_string()
        } else {
            body
        };

        Ok(FetchResponse {
            status,
            body: truncated,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(allowed: &[&str]) -> HttpFetcher {
        HttpFetcher::new(
            allowed.iter().map(|s| s.to_string()).collect(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn rejects_non_http_schemes() {
        let f = fetcher(&[]);
        assert!(f.check_policy("ftp://example.com/file").is_err());
        assert!(f.check_policy("file:///etc/passwd").is_err());
        assert!(f.check_policy("not a url").is_err());
    }

    #[test]
    fn blocks_loopback_and_metadata_hosts() {
        let f = fetcher(&[]);
        assert!(f.check_policy("http://localhost:8080/admin").is_err());
        assert!(f.check_policy("http://127.0.0.1/").is_err());
        assert!(f.check_policy("http://169.254.169.254/latest/meta-data/").is_err());
    }

    #[test]
    fn empty_allowlist_permits_public_hosts() {
        let f = fetcher(&[]);
        assert!(f.check_policy("https://api.example.com/status").is_ok());
    }

    #[test]
    fn allowlist_restricts_to_listed_hosts_and_subdomains() {
        let f = fetcher(&["example.com"]);
        assert!(f.check_policy("https://example.com/x").is_ok());
        assert!(f.check_policy("https://api.example.com/x").is_ok());
        assert!(f.check_policy("https://evilexample.com/x").is_err());
        assert!(f.check_policy("https://other.org/x").is_err());
    }

    #[test]
    fn allowlisted_loopback_is_permitted() {
        let f = fetcher(&["localhost"]);
        assert!(f.check_policy("http://localhost:9000/ok").is_ok());
    }

    #[tokio::test]
    async fn disallowed_url_maps_to_fetch_error() {
        let f = fetcher(&[]);
        let err = f.get("gopher://example.com").await.unwrap_err();
        assert!(matches!(err, FetchError::DisallowedUrl(_)));
    }
}
