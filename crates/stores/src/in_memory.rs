//! In-memory backend — useful for testing and ephemeral runs.

use async_trait::async_trait;
use chrono::Utc;
use crabdesk_core::error::StoreError;
use crabdesk_core::store::{
    KbHit, KnowledgeEntry, KnowledgeStore, Ticket, TicketPriority, TicketStatus, TicketStore,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory knowledge base and ticket store.
///
/// Keyword search with naive relevance ordering; no persistence.
pub struct InMemoryStores {
    kb: Arc<RwLock<Vec<KnowledgeEntry>>>,
    tickets: Arc<RwLock<Vec<Ticket>>>,
    next_ticket_id: Arc<RwLock<i64>>,
}

impl InMemoryStores {
    pub fn new() -> Self {
        Self {
            kb: Arc::new(RwLock::new(Vec::new())),
            tickets: Arc::new(RwLock::new(Vec::new())),
            next_ticket_id: Arc::new(RwLock::new(1)),
        }
    }
}

impl Default for InMemoryStores {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStores {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KbHit>, StoreError> {
        let kb = self.kb.read().await;
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let mut scored: Vec<(usize, KbHit)> = kb
            .iter()
            .filter_map(|e| {
                let haystack =
                    format!("{} {} {}", e.title, e.content, e.tags).to_lowercase();
                let score: usize = terms.iter().filter(|t| haystack.contains(*t)).count();
                (score > 0).then(|| {
                    (
                        score,
                        KbHit {
                            title: e.title.clone(),
                            content: e.content.clone(),
                        },
                    )
                })
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    async fn add(&self, entry: KnowledgeEntry) -> Result<bool, StoreError> {
        if entry.title.trim().is_empty() || entry.content.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "KB entries require a title and content".into(),
            ));
        }
        self.kb.write().await.push(entry);
        Ok(true)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.kb.read().await.len())
    }
}

#[async_trait]
impl TicketStore for InMemoryStores {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create(
        &self,
        customer_name: &str,
        customer_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<i64, StoreError> {
        if customer_name.trim().is_empty()
            || customer_email.trim().is_empty()
            || subject.trim().is_empty()
        {
            return Err(StoreError::InvalidInput(
                "customer_name, customer_email, and subject are required".into(),
            ));
        }

        let mut next_id = self.next_ticket_id.write().await;
        let id = *next_id;
        *next_id += 1;

        let now = Utc::now();
        self.tickets.write().await.push(Ticket {
            id,
            customer_name: customer_name.trim().into(),
            customer_email: customer_email.trim().into(),
            subject: subject.trim().into(),
            body: body.trim().into(),
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update_status(&self, id: i64, status: TicketStatus) -> Result<bool, StoreError> {
        let mut tickets = self.tickets.write().await;
        match tickets.iter_mut().find(|t| t.id == id) {
            Some(ticket) => {
                ticket.status = status;
                ticket.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: i64) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn list_open(&self) -> Result<Vec<Ticket>, StoreError> {
        let mut open: Vec<Ticket> = self
            .tickets
            .read()
            .await
            .iter()
            .filter(|t| t.status == TicketStatus::Open)
            .cloned()
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, content: &str, tags: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            title: title.into(),
            content: content.into(),
            category: String::new(),
            tags: tags.into(),
        }
    }

    #[tokio::test]
    async fn search_ranks_by_term_overlap() {
        let stores = InMemoryStores::new();
        KnowledgeStore::add(
            &stores,
            entry("Return Policy", "Returns accepted within 30 days.", "return refund"),
        )
        .await
        .unwrap();
        KnowledgeStore::add(
            &stores,
            entry("Shipping", "Standard shipping is free over $50.", "shipping"),
        )
        .await
        .unwrap();

        let hits = stores.search("return refund policy", 5).await.unwrap();
        assert_eq!(hits[0].title, "Return Policy");
    }

    #[tokio::test]
    async fn ticket_ids_are_sequential() {
        let stores = InMemoryStores::new();
        let a = stores.create("A", "a@x.com", "s", "").await.unwrap();
        let b = stores.create("B", "b@x.com", "s", "").await.unwrap();
        assert_eq!(b, a + 1);
    }

    #[tokio::test]
    async fn update_unknown_ticket_returns_false() {
        let stores = InMemoryStores::new();
        assert!(!stores.update_status(7, TicketStatus::Closed).await.unwrap());
    }
}
