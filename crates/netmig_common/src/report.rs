//! Caller-facing step report, printed as JSON by netmigctl.

use crate::aggregate::EntityIssue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal result of one migration step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// A mutation (patch/delete) was performed
    pub changed: bool,
    pub failed: bool,
    pub msg: String,
    /// Extracted value on success, observed value on mismatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub issues: Vec<EntityIssue>,
    pub checked_at: DateTime<Utc>,
}

impl StepReport {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            failed: false,
            msg: msg.into(),
            value: None,
            issues: Vec::new(),
            checked_at: Utc::now(),
        }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            ..Self::success(msg)
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }

    pub fn with_issues(mut self, issues: Vec<EntityIssue>) -> Self {
        self.issues = issues;
        self
    }

    /// Process exit code: 0 on success, 1 on a failed check.
    pub fn exit_code(&self) -> i32 {
        if self.failed {
            1
        } else {
            0
        }
    }
}
