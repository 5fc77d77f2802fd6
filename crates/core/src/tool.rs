//! Tool catalog — the static description of every callable action.
//!
//! The catalog is serialized verbatim into the planning prompt AND drives
//! plan validation (required arguments, defaults), so the planner's
//! vocabulary and the executor's dispatch can never drift apart. It is
//! immutable after construction: adding a tool is a deployment-time
//! change, not a runtime operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The scalar kind of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    String,
    Integer,
}

/// Schema for a single tool argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Argument name
    pub name: String,

    /// Scalar kind
    pub kind: ArgKind,

    /// Whether the planner must supply this argument
    pub required: bool,

    /// Default filled in by the validator when the argument is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Description surfaced to the planning oracle
    pub description: String,
}

impl ArgSpec {
    pub fn required(name: &str, kind: ArgKind, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: description.into(),
        }
    }

    pub fn optional(name: &str, kind: ArgKind, default: Value, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: Some(default),
            description: description.into(),
        }
    }
}

/// Description of one callable action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The action name — part of the contract with the planning oracle,
    /// never renamed without re-validating prompts.
    pub name: String,

    /// What the tool does (sent to the oracle)
    pub description: String,

    /// Argument schemas, in declaration order
    pub args: Vec<ArgSpec>,
}

impl ToolSpec {
    pub fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Names of arguments the planner must supply.
    pub fn required_args(&self) -> impl Iterator<Item = &ArgSpec> {
        self.args.iter().filter(|a| a.required)
    }
}

/// The ordered, immutable catalog of callable actions.
///
/// Ordering is stable across a process lifetime; the planner prompt and
/// the validator both read from the same instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
}

impl ToolCatalog {
    pub fn new(specs: Vec<ToolSpec>) -> Self {
        Self { specs }
    }

    /// All specs in declaration order.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Look up a spec by action name.
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Whether `name` is a registered action.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Serialize the catalog for embedding into the planning prompt.
    ///
    /// The same instance that validates plans produces this text, so the
    /// oracle's vocabulary and the dispatch table come from one source.
    pub fn describe_for_prompt(&self) -> String {
        let entries: Vec<Value> = self
            .specs
            .iter()
            .map(|s| {
                let args: Vec<Value> = s
                    .args
                    .iter()
                    .map(|a| {
                        serde_json::json!({
                            "name": a.name,
                            "type": match a.kind {
                                ArgKind::String => "string",
                                ArgKind::Integer => "integer",
                            },
                            "required": a.required,
                            "default": a.default,
                            "description": a.description,
                        })
                    })
                    .collect();
                serde_json::json!({
                    "action": s.name,
                    "description": s.description,
                    "args": args,
                })
            })
            .collect();
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".into())
    }
}
