//! Node machine-config records from `oc describe node` output.
//!
//! The input is the full `oc describe node` output. Only these lines matter:
//!
//! ```text
//!                     kubernetes.io/hostname=worker-0
//!                     machineconfiguration.openshift.io/currentConfig: rendered-worker-1a2b
//!                     machineconfiguration.openshift.io/desiredConfig: rendered-worker-1a2b
//!                     machineconfiguration.openshift.io/state: Done
//! ```
//!
//! Parsing is two-phase. `tokenize_line` turns one line into a `Token`, and
//! `parse_records` runs a small state machine over the tokens. A record is a
//! hostname followed by currentConfig, desiredConfig and state, in that
//! order. Lines with other keys are skipped. Anything else that breaks the
//! order drops the partial record; it never fails the whole parse.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Phase value of a node that finished applying its config
pub const PHASE_DONE: &str = "Done";

/// `[Labels:|Annotations:] <key> (:|=) <value>`, case-insensitive
static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:labels|annotations):\s+)?(?P<key>[a-z0-9._/-]+)\s*[:=]\s*(?P<value>.*?)\s*$",
    )
    .unwrap()
});

/// One node's machine-config state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node hostname
    pub identity: String,
    /// Rendered config currently applied
    pub current_state: String,
    /// Rendered config the node should converge to
    pub desired_state: String,
    /// Machine config daemon state (`Done`, `Working`, `Degraded`, ...)
    pub phase: String,
}

impl NodeRecord {
    /// Field-level compliance: settled and converged.
    pub fn is_settled(&self) -> bool {
        self.phase == PHASE_DONE && self.current_state == self.desired_state
    }
}

/// One tokenized input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Hostname(String),
    CurrentConfig(String),
    DesiredConfig(String),
    State(String),
    /// Anything that is not a record field
    Other,
}

/// Classify one line by the last `/` segment of its key.
pub fn tokenize_line(line: &str) -> Token {
    let Some(caps) = FIELD_LINE.captures(line) else {
        return Token::Other;
    };
    let key = caps["key"].to_ascii_lowercase();
    let value = caps["value"].to_string();
    let field = key.rsplit('/').next().unwrap_or(key.as_str());

    match field {
        "hostname" => Token::Hostname(value),
        "currentconfig" => Token::CurrentConfig(value),
        "desiredconfig" => Token::DesiredConfig(value),
        "state" => Token::State(value),
        _ => Token::Other,
    }
}

#[derive(Debug, Default)]
struct Partial {
    identity: String,
    current_state: Option<String>,
    desired_state: Option<String>,
}

/// Extract every well-formed record, in input order.
pub fn parse_records(text: &str) -> Vec<NodeRecord> {
    let mut records = Vec::new();
    let mut partial: Option<Partial> = None;

    for line in text.lines() {
        let token = tokenize_line(line);
        if let Token::Hostname(identity) = token {
            partial = (!identity.is_empty()).then(|| Partial {
                identity,
                ..Partial::default()
            });
            continue;
        }

        let Some(mut current) = partial.take() else {
            continue;
        };

        partial = match token {
            Token::Other => Some(current),
            Token::CurrentConfig(v)
                if !v.is_empty() && current.current_state.is_none() =>
            {
                current.current_state = Some(v);
                Some(current)
            }
            Token::DesiredConfig(v)
                if !v.is_empty()
                    && current.current_state.is_some()
                    && current.desired_state.is_none() =>
            {
                current.desired_state = Some(v);
                Some(current)
            }
            Token::State(v) if !v.is_empty() => {
                if let (Some(current_state), Some(desired_state)) =
                    (current.current_state, current.desired_state)
                {
                    records.push(NodeRecord {
                        identity: current.identity,
                        current_state,
                        desired_state,
                        phase: v,
                    });
                }
                None
            }
            // Out of order or empty field: drop the partial record
            _ => None,
        };
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_NODES: &str = "\
                    kubernetes.io/hostname=master-0
                    machineconfiguration.openshift.io/currentConfig: rendered-master-aaa
                    machineconfiguration.openshift.io/desiredConfig: rendered-master-aaa
                    machineconfiguration.openshift.io/state: Done
                    kubernetes.io/hostname=worker-0
                    machineconfiguration.openshift.io/currentConfig: rendered-worker-bbb
                    machineconfiguration.openshift.io/desiredConfig: rendered-worker-ccc
                    machineconfiguration.openshift.io/state: Working
";

    #[test]
    fn test_tokenize_line() {
        assert_eq!(
            tokenize_line("   kubernetes.io/hostname=worker-0"),
            Token::Hostname("worker-0".to_string())
        );
        assert_eq!(
            tokenize_line("machineconfiguration.openshift.io/currentConfig: rendered-a  "),
            Token::CurrentConfig("rendered-a".to_string())
        );
        assert_eq!(
            tokenize_line("Annotations:  machineconfiguration.openshift.io/desiredConfig: rendered-b"),
            Token::DesiredConfig("rendered-b".to_string())
        );
        assert_eq!(
            tokenize_line("MACHINECONFIGURATION.OPENSHIFT.IO/STATE :  Done"),
            Token::State("Done".to_string())
        );
        assert_eq!(
            tokenize_line("machineconfiguration.openshift.io/reason:"),
            Token::Other
        );
        assert_eq!(tokenize_line(""), Token::Other);
    }

    #[test]
    fn test_parse_two_nodes() {
        let records = parse_records(TWO_NODES);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            NodeRecord {
                identity: "master-0".to_string(),
                current_state: "rendered-master-aaa".to_string(),
                desired_state: "rendered-master-aaa".to_string(),
                phase: "Done".to_string(),
            }
        );
        assert!(records[0].is_settled());
        assert_eq!(records[1].identity, "worker-0");
        assert!(!records[1].is_settled());
    }

    #[test]
    fn test_unrelated_annotations_are_skipped() {
        let text = "\
Labels:             kubernetes.io/hostname=worker-1
Annotations:        machineconfiguration.openshift.io/controlPlaneTopology: HighlyAvailable
                    machineconfiguration.openshift.io/currentConfig: rendered-worker-x
                    machineconfiguration.openshift.io/desiredConfig: rendered-worker-x
                    machineconfiguration.openshift.io/desiredDrain: uncordon-rendered-worker-x
                    machineconfiguration.openshift.io/reason:
                    machineconfiguration.openshift.io/state: Done
";
        let records = parse_records(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, "worker-1");
        assert!(records[0].is_settled());
    }

    #[test]
    fn test_full_describe_output() {
        let text = "\
Name:               worker-0
Roles:              worker
Labels:             beta.kubernetes.io/arch=amd64
                    kubernetes.io/hostname=worker-0
                    node-role.kubernetes.io/worker=
Annotations:        machine.openshift.io/machine: openshift-machine-api/worker-0
                    machineconfiguration.openshift.io/currentConfig: rendered-worker-x
                    machineconfiguration.openshift.io/desiredConfig: rendered-worker-x
                    machineconfiguration.openshift.io/reason:
                    machineconfiguration.openshift.io/state: Done
CreationTimestamp:  Mon, 01 Jan 2024 10:00:00 +0000
Conditions:
  Type             Status  LastHeartbeatTime                 Reason
  ----             ------  -----------------                 ------
  Ready            True    Mon, 01 Jan 2024 10:00:00 +0000   KubeletReady
Addresses:
  InternalIP:  10.0.0.5
  Hostname:    worker-0


Name:               worker-1
Labels:             kubernetes.io/hostname=worker-1
Annotations:        machineconfiguration.openshift.io/currentConfig: rendered-worker-x
                    machineconfiguration.openshift.io/desiredConfig: rendered-worker-y
                    machineconfiguration.openshift.io/state: Working
Addresses:
  Hostname:    worker-1
";
        let records = parse_records(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identity, "worker-0");
        assert!(records[0].is_settled());
        assert_eq!(records[1].identity, "worker-1");
        assert_eq!(records[1].desired_state, "rendered-worker-y");
        assert_eq!(records[1].phase, "Working");
    }

    #[test]
    fn test_malformed_records_are_absent() {
        let text = "\
kubernetes.io/hostname=broken-missing-state
machineconfiguration.openshift.io/currentConfig: rendered-a
machineconfiguration.openshift.io/desiredConfig: rendered-a
kubernetes.io/hostname=broken-out-of-order
machineconfiguration.openshift.io/desiredConfig: rendered-a
machineconfiguration.openshift.io/currentConfig: rendered-a
machineconfiguration.openshift.io/state: Done
kubernetes.io/hostname=good
machineconfiguration.openshift.io/currentConfig: rendered-b
machineconfiguration.openshift.io/desiredConfig: rendered-b
machineconfiguration.openshift.io/state: Done
machineconfiguration.openshift.io/state: Done
";
        let records = parse_records(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, "good");
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(parse_records("").is_empty());
        assert!(parse_records("error: You must be logged in to the server").is_empty());
    }
}
