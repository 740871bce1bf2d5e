//! Condition evaluation over probe payloads.
//!
//! Evaluation is pure: the same payload and spec always give the same
//! answer, so the poll driver can call it once per attempt without any
//! carried state.

use crate::records::{parse_records, NodeRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What "done" means for a probe payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionSpec {
    /// A successful exit is enough
    Succeeded,
    /// The whole JSON document, rendered as a scalar, equals `expected`
    ExactValue { expected: String },
    /// A dotted path into the JSON document equals `expected`
    PathExtract { path: String, expected: String },
    /// Every node record is settled, and at least one exists
    MultiRecordExtract,
    /// The raw payload contains `needle`
    Contains { needle: String },
}

/// Value extracted from a matching payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extracted {
    Value(String),
    Records(Vec<NodeRecord>),
}

impl Extracted {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Records(_) => None,
        }
    }

    pub fn as_records(&self) -> Option<&[NodeRecord]> {
        match self {
            Self::Records(r) => Some(r),
            Self::Value(_) => None,
        }
    }
}

/// Result of checking one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Matched(Extracted),
    Mismatched(String),
    /// Structured payload could not be parsed; never retried
    ParseError(String),
}

/// Check `payload` against `spec`.
pub fn evaluate(payload: &str, spec: &ConditionSpec) -> Evaluation {
    match spec {
        ConditionSpec::Succeeded => Evaluation::Matched(Extracted::Value(payload.to_string())),
        ConditionSpec::ExactValue { expected } => compare_json(payload, "", expected),
        ConditionSpec::PathExtract { path, expected } => compare_json(payload, path, expected),
        ConditionSpec::MultiRecordExtract => evaluate_records(payload),
        ConditionSpec::Contains { needle } => {
            if payload.contains(needle.as_str()) {
                Evaluation::Matched(Extracted::Value(needle.clone()))
            } else {
                Evaluation::Mismatched(format!("output does not contain '{}'", needle))
            }
        }
    }
}

fn compare_json(payload: &str, path: &str, expected: &str) -> Evaluation {
    let document: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => return Evaluation::ParseError(format!("invalid JSON: {}", e)),
    };

    let actual = extract_path(&document, path);
    if actual == expected {
        Evaluation::Matched(Extracted::Value(actual))
    } else {
        let field = if path.is_empty() { "value" } else { path };
        Evaluation::Mismatched(format!(
            "{} is '{}', expected '{}'",
            field, actual, expected
        ))
    }
}

/// Walk a dotted path through nested objects. Absent paths yield "".
pub fn extract_path(document: &Value, path: &str) -> String {
    let mut current = document;
    for key in path.split('.').filter(|k| !k.is_empty()) {
        match current.get(key) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    render_scalar(current)
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn evaluate_records(payload: &str) -> Evaluation {
    let records = parse_records(payload);
    if records.is_empty() {
        return Evaluation::Mismatched("no node records found in output".to_string());
    }

    let pending: Vec<String> = records
        .iter()
        .filter(|r| !r.is_settled())
        .map(|r| {
            format!(
                "{} (state {}, current {}, desired {})",
                r.identity, r.phase, r.current_state, r.desired_state
            )
        })
        .collect();

    if pending.is_empty() {
        Evaluation::Matched(Extracted::Records(records))
    } else {
        Evaluation::Mismatched(format!(
            "{} of {} nodes not settled: {}",
            pending.len(),
            records.len(),
            pending.join(", ")
        ))
    }
}
