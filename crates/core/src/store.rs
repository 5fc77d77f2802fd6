//! Knowledge store and ticket store traits.
//!
//! The two external stores are the only shared mutable resources the core
//! touches. Both are treated as single-writer-safe black boxes: every
//! logical operation is atomic from the executor's point of view, and the
//! core never caches store state across requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A ranked knowledge search result. The core only ever sees title and
/// content; category and tags stay inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbHit {
    pub title: String,
    pub content: String,
}

/// A full knowledge base entry, as written by admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: String,
}

/// Knowledge base collaborator.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Ranked search. An empty result list is not an error.
    async fn search(&self, query: &str, limit: usize)
    -> std::result::Result<Vec<KbHit>, StoreError>;

    /// Add an entry. Returns false when the store declined the write.
    async fn add(&self, entry: KnowledgeEntry) -> std::result::Result<bool, StoreError>;

    /// Total entry count.
    async fn count(&self) -> std::result::Result<usize, StoreError>;
}

/// Lifecycle states of a support ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Pending,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Pending => "pending",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "pending" => Some(TicketStatus::Pending),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

/// Ticket priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TicketPriority::Low),
            "medium" => Some(TicketPriority::Medium),
            "high" => Some(TicketPriority::High),
            "urgent" => Some(TicketPriority::Urgent),
            _ => None,
        }
    }
}

/// A support ticket as the store records it. The agent core only ever sees
/// the id returned at creation time; the full entity serves the admin
/// endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ticket store collaborator.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// The backend name.
    fn name(&self) -> &str;

    /// Create a ticket; name, email, and subject are required.
    async fn create(
        &self,
        customer_name: &str,
        customer_email: &str,
        subject: &str,
        body: &str,
    ) -> std::result::Result<i64, StoreError>;

    /// Update a ticket's status. Returns false when the id is unknown.
    async fn update_status(
        &self,
        id: i64,
        status: TicketStatus,
    ) -> std::result::Result<bool, StoreError>;

    /// Fetch a single ticket.
    async fn get(&self, id: i64) -> std::result::Result<Option<Ticket>, StoreError>;

    /// All tickets currently open, newest first.
    async fn list_open(&self) -> std::result::Result<Vec<Ticket>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for s in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Pending,
            TicketStatus::Closed,
        ] {
            assert_eq!(TicketStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(TicketStatus::parse("escalated"), None);
    }

    #[test]
    fn priority_roundtrip() {
        for p in [
            TicketPriority::Low,
            TicketPriority::Medium,
            TicketPriority::High,
            TicketPriority::Urgent,
        ] {
            assert_eq!(TicketPriority::parse(p.as_str()), Some(p));
        }
    }
}
