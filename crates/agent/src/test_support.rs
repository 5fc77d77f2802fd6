//! Shared test helpers for agent tests.

use async_trait::async_trait;
use crabdesk_core::error::OracleError;
use crabdesk_core::oracle::{Oracle, OracleRequest, OracleResponse};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock oracle that returns a sequence of scripted outcomes.
///
/// Each call to `complete` consumes the next outcome in the queue; a
/// drained (or empty) queue behaves as an unreachable oracle.
pub struct SequentialMockOracle {
    outcomes: Mutex<Vec<Result<String, OracleError>>>,
    calls: AtomicUsize,
}

impl SequentialMockOracle {
    pub fn new(outcomes: Vec<Result<String, OracleError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            calls: AtomicUsize::new(0),
        }
    }

    /// An oracle that returns a single text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// An oracle whose every call fails with a network error.
    pub fn always_failing() -> Self {
        Self {
            outcomes: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for SequentialMockOracle {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, _request: OracleRequest) -> Result<OracleResponse, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut outcomes = self.outcomes.lock().unwrap();

        // An empty (or drained) queue behaves as an unreachable oracle.
        if outcomes.is_empty() {
            return Err(OracleError::Network("mock oracle unreachable".into()));
        }

        match outcomes.remove(0) {
            Ok(text) => Ok(OracleResponse {
                text,
                model: "mock-model".into(),
                usage: None,
            }),
            Err(e) => Err(e),
        }
    }
}
