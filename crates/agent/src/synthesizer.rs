//! Response synthesizer — fallback prose generation from the trace.
//!
//! Invoked by the executor when no `respond` step produced text. The
//! prompt is a pure function of the trace: aggregated knowledge results
//! and ticket outcomes first, then the raw trace, so identical traces
//! always build identical prompts even though the oracle's output varies.

use crabdesk_core::error::OracleError;
use crabdesk_core::message::ChatMessage;
use crabdesk_core::oracle::{Oracle, OracleRequest};
use crabdesk_core::trace::TraceEntry;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a customer support assistant. Given the execution \
     trace of tools and findings below, write a short, friendly customer-facing reply summarizing \
     what was found, the next steps, and a polite closing. Do not mention the trace or the tools \
     by name.";

/// The response synthesizer.
pub struct Synthesizer {
    oracle: Arc<dyn Oracle>,
    model: String,
    temperature: f32,
}

impl Synthesizer {
    pub fn new(oracle: Arc<dyn Oracle>, model: impl Into<String>) -> Self {
        Self {
            oracle,
            model: model.into(),
            temperature: 0.4,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the synthesis prompt from a trace. Deterministic.
    fn build_prompt(&self, trace: &[TraceEntry]) -> Vec<ChatMessage> {
        let mut user = String::new();

        let kb_hits = aggregate_kb_hits(trace);
        if kb_hits.is_empty() {
            user.push_str("Knowledge base findings: none.\n");
        } else {
            user.push_str("Knowledge base findings:\n");
            for (title, content) in &kb_hits {
                user.push_str(&format!("- {title}: {content}\n"));
            }
        }

        let (created, failed) = aggregate_ticket_outcomes(trace);
        if !created.is_empty() {
            user.push_str(&format!(
                "Support tickets created: {}\n",
                created
                    .iter()
                    .map(|id| format!("#{id}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if failed > 0 {
            user.push_str(&format!("Ticket creation attempts that failed: {failed}\n"));
        }

        user.push_str("\nExecution trace (JSON):\n");
        user.push_str(&serde_json::to_string(trace).unwrap_or_else(|_| "[]".into()));

        vec![ChatMessage::system(SYNTHESIS_SYSTEM_PROMPT), ChatMessage::user(user)]
    }

    /// Turn a trace into customer-facing prose.
    pub async fn synthesize(&self, trace: &[TraceEntry]) -> Result<String, OracleError> {
        let request = OracleRequest::new(self.model.clone(), self.build_prompt(trace))
            .with_temperature(self.temperature);

        let response = self.oracle.complete(request).await?;
        let text = response.text.trim().to_string();
        if text.is_empty() {
            return Err(OracleError::Malformed("empty synthesis output".into()));
        }

        debug!(chars = text.len(), "Synthesized reply");
        Ok(text)
    }
}

fn aggregate_kb_hits(trace: &[TraceEntry]) -> Vec<(String, String)> {
    trace
        .iter()
        .filter(|e| e.action == "search_kb")
        .filter_map(|e| e.result.as_ref())
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|hit| {
            let title = hit.get("title")?.as_str()?.to_string();
            let content = hit.get("content")?.as_str()?.to_string();
            Some((title, content))
        })
        .collect()
}

fn aggregate_ticket_outcomes(trace: &[TraceEntry]) -> (Vec<i64>, usize) {
    let mut created = Vec::new();
    let mut failed = 0usize;
    for entry in trace.iter().filter(|e| e.action == "create_ticket") {
        match entry.result.as_ref().and_then(|r| r.get("ticket_id")).and_then(Value::as_i64) {
            Some(id) => created.push(id),
            None => failed += 1,
        }
    }
    (created, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SequentialMockOracle;
    use serde_json::json;

    fn search_entry() -> TraceEntry {
        TraceEntry::success(
            "search_kb",
            "",
            json!({"query": "returns"}),
            json!([{"title": "Return Policy", "content": "30 days, full refund."}]),
        )
    }

    #[test]
    fn prompt_aggregates_kb_and_tickets() {
        let synth = Synthesizer::new(Arc::new(SequentialMockOracle::single_text("ok")), "m");
        let trace = vec![
            search_entry(),
            TraceEntry::success("create_ticket", "", json!({}), json!({"ticket_id": 7})),
            TraceEntry::failure("create_ticket", "", json!({}), "ticket_creation_failed"),
        ];
        let prompt = synth.build_prompt(&trace);
        let body = &prompt[1].content;
        assert!(body.contains("Return Policy"));
        assert!(body.contains("#7"));
        assert!(body.contains("failed: 1"));
    }

    #[test]
    fn identical_traces_build_identical_prompts() {
        let synth = Synthesizer::new(Arc::new(SequentialMockOracle::single_text("ok")), "m");
        let trace = vec![search_entry()];
        assert_eq!(synth.build_prompt(&trace)[1].content, synth.build_prompt(&trace)[1].content);
    }

    #[test]
    fn empty_trace_prompt_notes_no_findings() {
        let synth = Synthesizer::new(Arc::new(SequentialMockOracle::single_text("ok")), "m");
        let prompt = synth.build_prompt(&[]);
        assert!(prompt[1].content.contains("none"));
    }

    #[tokio::test]
    async fn empty_oracle_output_is_an_error() {
        let synth = Synthesizer::new(Arc::new(SequentialMockOracle::single_text("   ")), "m");
        let err = synth.synthesize(&[]).await.unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
    }

    #[tokio::test]
    async fn oracle_text_is_trimmed() {
        let synth = Synthesizer::new(
            Arc::new(SequentialMockOracle::single_text("\n  Thanks for reaching out!  \n")),
            "m",
        );
        let text = synth.synthesize(&[]).await.unwrap();
        assert_eq!(text, "Thanks for reaching out!");
    }
}
