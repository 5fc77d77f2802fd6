//! # Crabdesk Core
//!
//! Domain types, traits, and error definitions for the Crabdesk support
//! agent runtime. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (oracle, knowledge store, ticket store,
//! fetcher) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod fetch;
pub mod message;
pub mod oracle;
pub mod plan;
pub mod store;
pub mod tool;
pub mod trace;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, Error, FetchError, OracleError, PlanError, Result, StoreError};
pub use fetch::{FetchResponse, Fetcher};
pub use message::{ChatMessage, CustomerMetadata, InboundMessage, Role};
pub use oracle::{Oracle, OracleRequest, OracleResponse};
pub use plan::{Action, Plan, PlanItem, PlanStep, RejectedStep};
pub use store::{KbHit, KnowledgeEntry, KnowledgeStore, Ticket, TicketStatus, TicketStore};
pub use tool::{ArgKind, ArgSpec, ToolCatalog, ToolSpec};
pub use trace::{AgentReply, TraceEntry};
