//! Error types for netmig.
//!
//! Only terminal, non-retryable causes live here. Non-zero exits and
//! condition mismatches are ordinary values handled by the poll driver.

use thiserror::Error;

/// The probe mechanism itself could not run.
#[derive(Error, Debug)]
pub enum ExecutionFault {
    #[error("Probe command is empty")]
    EmptyCommand,

    #[error("Executable not found: {program}")]
    NotFound { program: String },

    #[error("Permission denied executing {program}")]
    PermissionDenied { program: String },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutionFault {
    /// Map a spawn error onto the fault taxonomy.
    pub fn from_io(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ExecutionFault::NotFound {
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => ExecutionFault::PermissionDenied {
                program: program.to_string(),
            },
            _ => ExecutionFault::Spawn {
                program: program.to_string(),
                source: err,
            },
        }
    }
}

/// Terminal failures of a poll run that are not timeouts.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("Execution fault: {0}")]
    Execution(#[from] ExecutionFault),

    #[error("Failed to parse output of '{command}': {detail}")]
    PayloadParse { command: String, detail: String },
}

impl PollError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PollError::Execution(_) => 2,
            PollError::PayloadParse { .. } => 2,
        }
    }
}
