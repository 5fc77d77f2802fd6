//! Store backends for Crabdesk.
//!
//! The knowledge base and the ticket store are the agent's two external
//! stores. Both live behind the traits in `crabdesk-core`; the SQLite
//! backend serves production, the in-memory backend serves tests and
//! ephemeral runs. Each logical operation is atomic from the executor's
//! point of view — the stores own their serialization, the core never
//! locks.

pub mod in_memory;
pub mod seed;
pub mod sqlite;

pub use in_memory::InMemoryStores;
pub use seed::seed_knowledge_base;
pub use sqlite::SqliteStores;
