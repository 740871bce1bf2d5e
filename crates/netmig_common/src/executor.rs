//! Probe executor trait and its implementations.
//!
//! Production code uses `RealProbeExecutor`, which spawns the command.
//! Tests use `FakeProbeExecutor` with scripted responses so poll loops can
//! run without a cluster.

use crate::error::ExecutionFault;
use crate::probe::{ProbeRequest, ProbeResult, ProbeStatus};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::process::Command;
use tracing::debug;

/// Runs exactly one external command. No retries at this layer.
///
/// A non-zero exit is an ordinary `ProbeResult`; only failures to start the
/// process at all are returned as `ExecutionFault`.
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    async fn execute(&self, request: &ProbeRequest) -> Result<ProbeResult, ExecutionFault>;
}

// ============================================================================
// Real Probe Executor
// ============================================================================

/// Spawns probes as child processes
#[derive(Debug, Default, Clone)]
pub struct RealProbeExecutor;

impl RealProbeExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProbeExecutor for RealProbeExecutor {
    async fn execute(&self, request: &ProbeRequest) -> Result<ProbeResult, ExecutionFault> {
        let mut command = match request {
            ProbeRequest::Argv { program, args } => {
                if program.is_empty() {
                    return Err(ExecutionFault::EmptyCommand);
                }
                let mut command = Command::new(program);
                command.args(args);
                command
            }
            ProbeRequest::Shell { command: line } => {
                if line.trim().is_empty() {
                    return Err(ExecutionFault::EmptyCommand);
                }
                let mut command = Command::new("sh");
                command.arg("-c").arg(line);
                command
            }
        };

        debug!("Executing: {}", request);

        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecutionFault::from_io(request.program(), e))?;

        let status = if output.status.success() {
            ProbeStatus::Success
        } else {
            ProbeStatus::Error(output.status.code())
        };

        Ok(ProbeResult {
            status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

// ============================================================================
// Fake Probe Executor (Testing)
// ============================================================================

/// Scripted response for one fake invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeResponse {
    /// Exit 0 with this stdout
    Ok(String),
    /// Non-zero exit with this stderr
    Fail { code: i32, stderr: String },
    /// The executable does not exist
    NotFound,
}

impl FakeResponse {
    pub fn ok(stdout: &str) -> Self {
        Self::Ok(stdout.to_string())
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        Self::Fail {
            code,
            stderr: stderr.to_string(),
        }
    }
}

/// Fake executor keyed by rendered command line.
///
/// Each command line owns a queue of responses. Responses are consumed in
/// order and the last one repeats forever. Unscripted commands fail with
/// exit code 127.
#[derive(Debug, Default, Clone)]
pub struct FakeProbeExecutor {
    responses: Arc<Mutex<HashMap<String, VecDeque<FakeResponse>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeProbeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a command line
    pub fn respond(self, command_line: &str, response: FakeResponse) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(command_line.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Every command line executed so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times a command line was executed
    pub fn call_count(&self, command_line: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.as_str() == command_line)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_response(&self, command_line: &str) -> Option<FakeResponse> {
        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let queue = responses.get_mut(command_line)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ProbeExecutor for FakeProbeExecutor {
    async fn execute(&self, request: &ProbeRequest) -> Result<ProbeResult, ExecutionFault> {
        let command_line = request.to_string();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command_line.clone());

        match self.next_response(&command_line) {
            Some(FakeResponse::Ok(stdout)) => Ok(ProbeResult::success(stdout)),
            Some(FakeResponse::Fail { code, stderr }) => Ok(ProbeResult::failure(code, stderr)),
            Some(FakeResponse::NotFound) => Err(ExecutionFault::NotFound {
                program: request.program().to_string(),
            }),
            None => Ok(ProbeResult::failure(
                127,
                format!("no scripted response for '{}'", command_line),
            )),
        }
    }
}
