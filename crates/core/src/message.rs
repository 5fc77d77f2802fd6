//! Inbound message and oracle chat message types.
//!
//! These are the value objects at the two boundaries of the core:
//! a customer's message (plus light metadata) coming in, and the chat
//! messages sent to a language-model oracle going out.

use serde::{Deserialize, Serialize};

/// Opaque customer metadata accompanying a message.
///
/// Session continuity, if any, is the transport layer's concern — the core
/// only threads `session_id` through as an opaque string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl CustomerMetadata {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none() && self.customer_email.is_none() && self.session_id.is_none()
    }
}

/// One inbound customer message — the unit of work the agent handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The free-text customer message.
    pub text: String,

    /// Light metadata (name, email, session id).
    #[serde(default)]
    pub metadata: CustomerMetadata,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: CustomerMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: CustomerMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The role of a chat message sent to an oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (planner/synthesizer framing)
    System,
    /// The request body built from the customer message or trace
    User,
    /// An oracle response (unused in requests, present for completeness)
    Assistant,
}

/// A single chat message in an oracle request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
