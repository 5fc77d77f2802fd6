//! Plan executor — a single sequential pass over a validated plan.
//!
//! Each item is dispatched with an exhaustive match over the closed
//! action set; every item produces exactly one trace entry, in execution
//! order, and no step failure aborts the remaining plan. The trace is the
//! fold accumulator of the pass, never ambient shared state.
//!
//! Finalization: the LAST `respond` step's text wins. If no step produced
//! text, the synthesizer turns the trace into prose and a distinguished
//! `synthesize_reply` entry is appended. Only when synthesis fails AND
//! the static fallback reply is disabled does the request fail, with
//! `AgentError::NoReplyAvailable`.

use crabdesk_core::error::{AgentError, FetchError};
use crabdesk_core::fetch::Fetcher;
use crabdesk_core::plan::{Action, Plan, PlanItem};
use crabdesk_core::store::{KnowledgeStore, TicketStore};
use crabdesk_core::trace::{AgentReply, SYNTHESIZE_ACTION, TraceEntry};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::synthesizer::Synthesizer;

/// Reply substituted when no explicit reply exists and synthesis is
/// unreachable.
pub const STATIC_FALLBACK_REPLY: &str = "Thanks for reaching out. We've received your request \
     and a member of our support team will follow up with you shortly.";

/// The plan executor.
pub struct Executor {
    knowledge: Arc<dyn KnowledgeStore>,
    tickets: Arc<dyn TicketStore>,
    fetcher: Arc<dyn Fetcher>,
    synthesizer: Synthesizer,
    tool_timeout: Duration,
    static_fallback_reply: bool,
}

impl Executor {
    pub fn new(
        knowledge: Arc<dyn KnowledgeStore>,
        tickets: Arc<dyn TicketStore>,
        fetcher: Arc<dyn Fetcher>,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            knowledge,
            tickets,
            fetcher,
            synthesizer,
            tool_timeout: Duration::from_secs(10),
            static_fallback_reply: true,
        }
    }

    /// Set the per-tool-call timeout.
    pub fn with_tool_timeout(mut self, tool_timeout: Duration) -> Self {
        self.tool_timeout = tool_timeout;
        self
    }

    /// Enable or disable the static fallback reply.
    pub fn with_static_fallback(mut self, enabled: bool) -> Self {
        self.static_fallback_reply = enabled;
        self
    }

    /// Execute a plan to completion.
    pub async fn execute(&self, plan: Plan) -> Result<AgentReply, AgentError> {
        let mut trace: Vec<TraceEntry> = Vec::with_capacity(plan.len() + 1);
        let mut final_text: Option<String> = None;

        for item in plan.items {
            match item {
                PlanItem::Rejected(rejected) => {
                    debug!(action = %rejected.action, error = %rejected.error, "Skipping rejected step");
                    trace.push(TraceEntry::failure(
                        rejected.action,
                        rejected.reason,
                        rejected.raw_args,
                        rejected.error,
                    ));
                }
                PlanItem::Step(step) => {
                    let entry = self
                        .dispatch(&step.action, step.reason, step.raw_args, &mut final_text)
                        .await;
                    trace.push(entry);
                }
            }
        }

        let final_text = match final_text {
            Some(text) => text,
            None => self.finalize(&mut trace).await?,
        };

        info!(steps = trace.len(), "Plan executed");
        Ok(AgentReply { final_text, trace })
    }

    async fn dispatch(
        &self,
        action: &Action,
        reason: String,
        raw_args: Value,
        final_text: &mut Option<String>,
    ) -> TraceEntry {
        let name = action.name();
        match action {
            Action::SearchKb { query, top_k } => {
                match timeout(self.tool_timeout, self.knowledge.search(query, *top_k)).await {
                    Ok(Ok(hits)) => TraceEntry::success(name, reason, raw_args, json!(hits)),
                    Ok(Err(e)) => {
                        warn!(error = %e, "Knowledge search failed");
                        TraceEntry::failure(name, reason, raw_args, format!("search_failed: {e}"))
                    }
                    Err(_) => TraceEntry::failure(
                        name,
                        reason,
                        raw_args,
                        format!("timeout: knowledge search exceeded {}s", self.tool_timeout.as_secs()),
                    ),
                }
            }
            Action::CreateTicket {
                customer_name,
                customer_email,
                subject,
                body,
            } => {
                match timeout(
                    self.tool_timeout,
                    self.tickets.create(customer_name, customer_email, subject, body),
                )
                .await
                {
                    Ok(Ok(ticket_id)) => {
                        TraceEntry::success(name, reason, raw_args, json!({"ticket_id": ticket_id}))
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Ticket creation failed");
                        TraceEntry::failure(name, reason, raw_args, format!("ticket_creation_failed: {e}"))
                    }
                    Err(_) => TraceEntry::failure(
                        name,
                        reason,
                        raw_args,
                        format!("timeout: ticket creation exceeded {}s", self.tool_timeout.as_secs()),
                    ),
                }
            }
            Action::HttpGet { url } => {
                // The fetcher enforces its own bound; this is a backstop.
                match timeout(self.tool_timeout, self.fetcher.get(url)).await {
                    Ok(Ok(response)) => TraceEntry::success(name, reason, raw_args, json!(response)),
                    Ok(Err(FetchError::Timeout(secs))) => TraceEntry::failure(
                        name,
                        reason,
                        raw_args,
                        format!("timeout: fetch exceeded {secs}s"),
                    ),
                    Ok(Err(e)) => {
                        warn!(error = %e, url, "Fetch failed");
                        TraceEntry::failure(name, reason, raw_args, format!("fetch_failed: {e}"))
                    }
                    Err(_) => TraceEntry::failure(
                        name,
                        reason,
                        raw_args,
                        format!("timeout: fetch exceeded {}s", self.tool_timeout.as_secs()),
                    ),
                }
            }
            Action::Respond { text } => {
                // Later respond steps overwrite earlier ones.
                *final_text = Some(text.clone());
                TraceEntry::success(name, reason, raw_args, json!({"delivered_text": text}))
            }
        }
    }

    /// No explicit reply: synthesize one from the trace, or apply the
    /// fallback policy.
    async fn finalize(&self, trace: &mut Vec<TraceEntry>) -> Result<String, AgentError> {
        match self.synthesizer.synthesize(trace).await {
            Ok(text) => {
                trace.push(TraceEntry::success(
                    SYNTHESIZE_ACTION,
                    "",
                    Value::Null,
                    Value::String(text.clone()),
                ));
                Ok(text)
            }
            Err(e) if self.static_fallback_reply => {
                warn!(error = %e, "Synthesis unavailable, substituting static reply");
                trace.push(TraceEntry::failure(
                    SYNTHESIZE_ACTION,
                    "",
                    Value::Null,
                    format!("synthesis_unavailable: {e}"),
                ));
                Ok(STATIC_FALLBACK_REPLY.to_string())
            }
            Err(e) => Err(AgentError::NoReplyAvailable(e.to_string())),
        }
    }
}
