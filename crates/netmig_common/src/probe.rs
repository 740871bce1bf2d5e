//! Probe requests, raw results and the status gate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One external command to run against the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeRequest {
    /// Program plus arguments, no shell involved
    Argv { program: String, args: Vec<String> },
    /// Shell pipeline, run through `sh -c`
    Shell { command: String },
}

impl ProbeRequest {
    pub fn argv<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Argv {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Self::Shell {
            command: command.into(),
        }
    }

    /// Program name used for fault reporting.
    pub fn program(&self) -> &str {
        match self {
            Self::Argv { program, .. } => program,
            Self::Shell { .. } => "sh",
        }
    }
}

impl fmt::Display for ProbeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argv { program, args } if args.is_empty() => write!(f, "{}", program),
            Self::Argv { program, args } => write!(f, "{} {}", program, args.join(" ")),
            Self::Shell { command } => write!(f, "{}", command),
        }
    }
}

/// Exit status of one probe invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    Success,
    /// Non-zero exit; `None` when the process was killed by a signal
    Error(Option<i32>),
}

/// Raw output of one probe invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub status: ProbeStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProbeResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Success,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Error(Some(code)),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Outcome of the status gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Exit 0, carries trimmed stdout
    Success(String),
    /// Any other exit, carries trimmed stderr
    RetryableError(String),
}

/// Exit 0 is success, everything else is retryable. No parsing happens here.
pub fn classify(result: ProbeResult) -> Classified {
    match result.status {
        ProbeStatus::Success => Classified::Success(result.stdout.trim().to_string()),
        ProbeStatus::Error(_) => Classified::RetryableError(result.stderr.trim().to_string()),
    }
}
