//! Plan validation — shaping untrusted oracle output into a typed `Plan`.
//!
//! The oracle boundary is treated exactly like user input: everything is
//! parsed and validated here so that prompt or format changes never leak
//! into the executor. Failure levels:
//!
//! - No extractable `{"plan": [...]}` object at all → `PlanError::Malformed`
//!   (the planning adapter substitutes its fallback plan).
//! - A step with an unknown action or missing required arguments → a
//!   `RejectedStep` in plan order (the rest of the plan still runs).
//!
//! Optional arguments are filled from the catalog defaults; `reason` is
//! normalized to `""`. Order is preserved exactly; repeated steps are
//! executed repeatedly.

use crabdesk_core::error::PlanError;
use crabdesk_core::plan::{Action, Plan, PlanItem, PlanStep, RejectedStep};
use crabdesk_core::tool::ToolCatalog;
use serde_json::Value;
use tracing::debug;

/// Hard cap on knowledge search result counts, whatever the planner asks for.
const MAX_TOP_K: usize = 20;

/// Parse and validate raw oracle text into a `Plan`.
pub fn parse_plan(raw: &str, catalog: &ToolCatalog) -> Result<Plan, PlanError> {
    let root = extract_json_object(raw)
        .ok_or_else(|| PlanError::Malformed("no JSON object found in oracle output".into()))?;

    let steps = root
        .get("plan")
        .and_then(Value::as_array)
        .ok_or_else(|| PlanError::Malformed("missing 'plan' array".into()))?;

    let items = steps
        .iter()
        .map(|step| validate_step(step, catalog))
        .collect();

    Ok(Plan::new(items))
}

/// Extract the first JSON object from oracle text.
///
/// Tolerates Markdown code fences and prose around the object: tries the
/// whole text first, then a balanced-brace scan from the first `{`.
fn extract_json_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }

    let start = trimmed.find('{')?;
    let bytes = trimmed.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &trimmed[start..=start + offset];
                    return serde_json::from_str::<Value>(candidate)
                        .ok()
                        .filter(Value::is_object);
                }
            }
            _ => {}
        }
    }
    None
}

fn validate_step(step: &Value, catalog: &ToolCatalog) -> PlanItem {
    let reason = step
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let args = step.get("args").cloned().unwrap_or_else(|| Value::Object(Default::default()));

    let Some(action_name) = step.get("action").and_then(Value::as_str) else {
        return PlanItem::Rejected(RejectedStep {
            action: String::new(),
            reason,
            raw_args: args,
            error: "unknown_action: step has no action name".into(),
        });
    };

    if !catalog.contains(action_name) {
        debug!(action = action_name, "Dropping step with unregistered action");
        return PlanItem::Rejected(RejectedStep {
            action: action_name.into(),
            reason,
            raw_args: args,
            error: format!("unknown_action: '{action_name}' is not a registered tool"),
        });
    }

    match build_action(action_name, &args, catalog) {
        Ok(action) => PlanItem::Step(PlanStep {
            action,
            reason,
            raw_args: args,
        }),
        Err(error) => PlanItem::Rejected(RejectedStep {
            action: action_name.into(),
            reason,
            raw_args: args,
            error,
        }),
    }
}

/// Map a validated action name plus raw args to a typed `Action`,
/// filling catalog-declared defaults. The error string doubles as the
/// trace tag.
fn build_action(name: &str, args: &Value, catalog: &ToolCatalog) -> Result<Action, String> {
    match name {
        "search_kb" => {
            let query = required_str(args, "query")
                .map_err(|e| format!("invalid_arguments: {e}"))?;
            let default_top_k = catalog
                .get("search_kb")
                .and_then(|s| s.arg("top_k"))
                .and_then(|a| a.default.as_ref())
                .and_then(Value::as_u64)
                .unwrap_or(5) as usize;
            let top_k = args
                .get("top_k")
                .and_then(Value::as_u64)
                .map(|n| n as usize)
                .unwrap_or(default_top_k)
                .clamp(1, MAX_TOP_K);
            Ok(Action::SearchKb { query, top_k })
        }
        "create_ticket" => {
            let get = |key: &str| {
                required_str(args, key)
                    .map_err(|e| format!("ticket_creation_failed: {e}"))
            };
            Ok(Action::CreateTicket {
                customer_name: get("customer_name")?,
                customer_email: get("customer_email")?,
                subject: get("subject")?,
                body: args
                    .get("body")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        }
        "http_get" => {
            let url = required_str(args, "url")
                .map_err(|e| format!("invalid_arguments: {e}"))?;
            Ok(Action::HttpGet { url })
        }
        "respond" => {
            let text = required_str(args, "text")
                .map_err(|e| format!("invalid_arguments: {e}"))?;
            Ok(Action::Respond { text })
        }
        // Anything in the catalog is one of the four contract actions.
        other => Err(format!("unknown_action: '{other}' is not dispatchable")),
    }
}

fn required_str(args: &Value, key: &str) -> Result<String, String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("missing required argument '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crabdesk_core::plan::PlanItem;

    fn catalog() -> ToolCatalog {
        crabdesk_tools::standard_catalog()
    }

    #[test]
    fn plain_json_plan_parses() {
        let raw = r#"{"plan": [
            {"action": "search_kb", "args": {"query": "return policy"}, "reason": "look it up"},
            {"action": "respond", "args": {"text": "See our policy page."}}
        ]}"#;
        let plan = parse_plan(raw, &catalog()).unwrap();
        assert_eq!(plan.len(), 2);

        let steps: Vec<_> = plan.steps().collect();
        assert!(matches!(
            &steps[0].action,
            Action::SearchKb { query, top_k } if query == "return policy" && *top_k == 5
        ));
        assert_eq!(steps[0].reason, "look it up");
        assert_eq!(steps[1].reason, "");
    }

    #[test]
    fn fenced_json_with_prose_parses() {
        let raw = "Here is the plan you asked for:\n```json\n{\"plan\": [{\"action\": \"respond\", \"args\": {\"text\": \"hi\"}}]}\n```\nLet me know!";
        let plan = parse_plan(raw, &catalog()).unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn nested_braces_in_strings_do_not_confuse_extraction() {
        let raw = r#"sure: {"plan": [{"action": "respond", "args": {"text": "use {braces} freely }"}]}"#;
        let plan = parse_plan(raw, &catalog()).unwrap();
        let step = plan.steps().next().unwrap();
        assert!(matches!(&step.action, Action::Respond { text } if text.contains("{braces}")));
    }

    #[test]
    fn non_json_text_is_malformed() {
        let err = parse_plan("I cannot help with that.", &catalog()).unwrap_err();
        assert!(matches!(err, PlanError::Malformed(_)));
    }

    #[test]
    fn object_without_plan_key_is_malformed() {
        let err = parse_plan(r#"{"steps": []}"#, &catalog()).unwrap_err();
        assert!(matches!(err, PlanError::Malformed(_)));
    }

    #[test]
    fn empty_plan_array_is_a_valid_empty_plan() {
        let plan = parse_plan(r#"{"plan": []}"#, &catalog()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn unknown_action_is_rejected_not_fatal() {
        let raw = r#"{"plan": [
            {"action": "delete_database", "args": {}},
            {"action": "search_kb", "args": {"query": "shipping"}}
        ]}"#;
        let plan = parse_plan(raw, &catalog()).unwrap();
        assert_eq!(plan.len(), 2);

        match &plan.items[0] {
            PlanItem::Rejected(r) => {
                assert_eq!(r.action, "delete_database");
                assert!(r.error.starts_with("unknown_action"));
            }
            PlanItem::Step(_) => panic!("expected rejection"),
        }
        assert_eq!(plan.steps().count(), 1);
    }

    #[test]
    fn missing_subject_rejects_with_ticket_tag() {
        let raw = r#"{"plan": [{"action": "create_ticket", "args": {
            "customer_name": "Ada", "customer_email": "ada@example.com", "body": "order lost"
        }}]}"#;
        let plan = parse_plan(raw, &catalog()).unwrap();
        match &plan.items[0] {
            PlanItem::Rejected(r) => {
                assert!(r.error.starts_with("ticket_creation_failed"));
                assert!(r.error.contains("subject"));
            }
            PlanItem::Step(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn missing_body_defaults_to_empty() {
        let raw = r#"{"plan": [{"action": "create_ticket", "args": {
            "customer_name": "Ada", "customer_email": "ada@example.com", "subject": "Lost order"
        }}]}"#;
        let plan = parse_plan(raw, &catalog()).unwrap();
        let step = plan.steps().next().unwrap();
        assert!(matches!(&step.action, Action::CreateTicket { body, .. } if body.is_empty()));
    }

    #[test]
    fn top_k_is_clamped() {
        let raw = r#"{"plan": [{"action": "search_kb", "args": {"query": "x", "top_k": 500}}]}"#;
        let plan = parse_plan(raw, &catalog()).unwrap();
        let step = plan.steps().next().unwrap();
        assert!(matches!(&step.action, Action::SearchKb { top_k, .. } if *top_k == 20));
    }

    #[test]
    fn duplicate_steps_are_kept_in_order() {
        let raw = r#"{"plan": [
            {"action": "search_kb", "args": {"query": "a"}},
            {"action": "search_kb", "args": {"query": "a"}}
        ]}"#;
        let plan = parse_plan(raw, &catalog()).unwrap();
        assert_eq!(plan.steps().count(), 2);
    }
}
