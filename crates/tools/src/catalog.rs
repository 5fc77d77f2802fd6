//! The fixed tool catalog.
//!
//! Action names are part of the contract with the planning oracle and
//! must not be renamed without re-validating prompts.

use crabdesk_core::tool::{ArgKind, ArgSpec, ToolCatalog, ToolSpec};
use serde_json::json;

/// Default result count for knowledge searches when the planner omits `top_k`.
pub const DEFAULT_TOP_K: usize = 5;

/// Build the standard four-action catalog.
pub fn standard_catalog() -> ToolCatalog {
    ToolCatalog::new(vec![
        ToolSpec {
            name: "search_kb".into(),
            description: "Search the local knowledge base for articles relevant to the customer's question. Returns a ranked list of {title, content} items.".into(),
            args: vec![
                ArgSpec::required("query", ArgKind::String, "The search query"),
                ArgSpec::optional(
                    "top_k",
                    ArgKind::Integer,
                    json!(DEFAULT_TOP_K),
                    "Maximum number of results to return",
                ),
            ],
        },
        ToolSpec {
            name: "create_ticket".into(),
            description: "Open a support ticket for issues that need human follow-up. Returns the new ticket_id.".into(),
            args: vec![
                ArgSpec::required("customer_name", ArgKind::String, "Name of the customer"),
                ArgSpec::required("customer_email", ArgKind::String, "Email address of the customer"),
                ArgSpec::required("subject", ArgKind::String, "Short subject line for the ticket"),
                ArgSpec::optional("body", ArgKind::String, json!(""), "Description of the issue"),
            ],
        },
        ToolSpec {
            name: "http_get".into(),
            description: "Make an HTTP GET request to an external API when information outside the knowledge base is needed.".into(),
            args: vec![ArgSpec::required("url", ArgKind::String, "The URL to request")],
        },
        ToolSpec {
            name: "respond".into(),
            description: "Reply to the customer directly with the given text. Use this when no tool output is needed, or as the final step.".into(),
            args: vec![ArgSpec::required("text", ArgKind::String, "The reply text for the customer")],
        },
    ])
}
