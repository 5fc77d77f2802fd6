//! SQLite backend with FTS5 full-text knowledge search.
//!
//! One database file, two tables:
//! - `tickets` — support tickets with status/priority constraints
//! - `kb` — FTS5 virtual table for ranked knowledge search
//!
//! Pass `"sqlite::memory:"` for an in-process ephemeral database
//! (useful for tests).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crabdesk_core::error::StoreError;
use crabdesk_core::store::{
    KbHit, KnowledgeEntry, KnowledgeStore, Ticket, TicketPriority, TicketStatus, TicketStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed knowledge base and ticket store sharing one pool.
pub struct SqliteStores {
    pool: SqlitePool,
}

impl SqliteStores {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Unavailable(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let stores = Self { pool };
        stores.run_migrations().await?;
        info!("SQLite store backend initialized at {path}");
        Ok(stores)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let stores = Self { pool };
        stores.run_migrations().await?;
        Ok(stores)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_name  TEXT NOT NULL,
                customer_email TEXT NOT NULL,
                subject        TEXT NOT NULL,
                body           TEXT NOT NULL DEFAULT '',
                status         TEXT NOT NULL DEFAULT 'open'
                               CHECK(status IN ('open', 'in_progress', 'pending', 'closed')),
                priority       TEXT NOT NULL DEFAULT 'medium'
                               CHECK(priority IN ('low', 'medium', 'high', 'urgent')),
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("tickets table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("tickets index: {e}")))?;

        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS kb USING fts5(
                title,
                content,
                category,
                tags,
                tokenize='porter unicode61'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("kb FTS5 table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Build a safe FTS5 query from user text.
    ///
    /// FTS5 requires special syntax. We tokenize the user input into words
    /// and join them with OR, quoting each token to prevent injection of
    /// FTS operators. Prefix matching keeps partial words useful.
    fn sanitize_fts_query(text: &str) -> String {
        text.split_whitespace()
            .map(|w| {
                let clean: String = w
                    .chars()
                    .filter(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if clean.is_empty() {
                    return String::new();
                }
                format!("\"{clean}\"*")
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    fn row_to_ticket(row: &sqlx::sqlite::SqliteRow) -> Result<Ticket, StoreError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let customer_name: String = row
            .try_get("customer_name")
            .map_err(|e| StoreError::QueryFailed(format!("customer_name column: {e}")))?;
        let customer_email: String = row
            .try_get("customer_email")
            .map_err(|e| StoreError::QueryFailed(format!("customer_email column: {e}")))?;
        let subject: String = row
            .try_get("subject")
            .map_err(|e| StoreError::QueryFailed(format!("subject column: {e}")))?;
        let body: String = row
            .try_get("body")
            .map_err(|e| StoreError::QueryFailed(format!("body column: {e}")))?;
        let status_str: String = row
            .try_get("status")
            .map_err(|e| StoreError::QueryFailed(format!("status column: {e}")))?;
        let priority_str: String = row
            .try_get("priority")
            .map_err(|e| StoreError::QueryFailed(format!("priority column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::QueryFailed(format!("updated_at column: {e}")))?;

        Ok(Ticket {
            id,
            customer_name,
            customer_email,
            subject,
            body,
            status: TicketStatus::parse(&status_str).unwrap_or(TicketStatus::Open),
            priority: TicketPriority::parse(&priority_str).unwrap_or(TicketPriority::Medium),
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl KnowledgeStore for SqliteStores {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KbHit>, StoreError> {
        let fts_query = Self::sanitize_fts_query(query);
        if fts_query.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query("SELECT title, content FROM kb WHERE kb MATCH ?1 ORDER BY rank LIMIT ?2")
            .bind(&fts_query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("KB search: {e}")))?;

        rows.iter()
            .map(|row| {
                let title: String = row
                    .try_get("title")
                    .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?;
                let content: String = row
                    .try_get("content")
                    .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
                Ok(KbHit { title, content })
            })
            .collect()
    }

    async fn add(&self, entry: KnowledgeEntry) -> Result<bool, StoreError> {
        if entry.title.trim().is_empty() || entry.content.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "KB entries require a title and content".into(),
            ));
        }

        sqlx::query("INSERT INTO kb (title, content, category, tags) VALUES (?1, ?2, ?3, ?4)")
            .bind(entry.title.trim())
            .bind(entry.content.trim())
            .bind(&entry.category)
            .bind(&entry.tags)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("KB insert: {e}")))?;

        Ok(true)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM kb")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("KB count: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("n column: {e}")))?;
        Ok(n as usize)
    }
}

#[async_trait]
impl TicketStore for SqliteStores {
    fn name(&self) -> &str {
        "sqlite"
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

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO tickets (customer_name, customer_email, subject, body, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(customer_name.trim())
        .bind(customer_email.trim())
        .bind(subject.trim())
        .bind(body.trim())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Ticket insert: {e}")))?;

        let id = result.last_insert_rowid();
        info!(ticket_id = id, "Ticket created");
        Ok(id)
    }

    async fn update_status(&self, id: i64, status: TicketStatus) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE tickets SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Ticket update: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: i64) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query("SELECT * FROM tickets WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Ticket get: {e}")))?;

        row.as_ref().map(Self::row_to_ticket).transpose()
    }

    async fn list_open(&self) -> Result<Vec<Ticket>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM tickets WHERE status = 'open' ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Ticket list: {e}")))?;

        rows.iter().map(Self::row_to_ticket).collect()
    }
}
