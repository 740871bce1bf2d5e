//! Bounded condition polling.
//!
//! One poll run executes probes until the condition matches or the
//! deadline passes:
//!
//! ```text
//! Idle -> Polling -> Succeeded
//!                 -> TimedOut
//! ```
//!
//! Probe errors and condition mismatches are logged and retried after a
//! fixed delay. A payload that fails to parse, or a probe that cannot be
//! started at all, ends the run immediately with a `PollError`.
//!
//! The deadline is only checked between attempts. A slow command may run
//! past it; the engine never kills an in-flight probe.

use crate::condition::{evaluate, ConditionSpec, Evaluation, Extracted};
use crate::error::PollError;
use crate::executor::ProbeExecutor;
use crate::probe::{classify, Classified, ProbeRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Diagnostic used when no attempt produced anything to report
pub const NO_ATTEMPT_DIAGNOSTIC: &str = "no successful attempt";

/// Time budget of one poll run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    pub timeout: Duration,
    /// Fixed sleep between attempts
    pub delay: Duration,
    /// Optional cap on the number of attempts
    pub max_attempts: Option<u32>,
}

impl PollSettings {
    pub fn new(timeout: Duration, delay: Duration) -> Self {
        Self {
            timeout,
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Terminal outcome of one poll run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Matched {
        value: Extracted,
        attempts: u32,
    },
    TimedOut {
        /// Last retryable error or mismatch explanation
        diagnostic: String,
        /// Most recent successful payload, if any attempt succeeded
        last_payload: Option<String>,
        attempts: u32,
    },
}

impl PollOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Matched { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }
}

/// What one attempt produced
enum Attempt {
    Done(PollOutcome),
    Retry {
        diagnostic: String,
        payload: Option<String>,
    },
}

/// Drives probes against a condition within a time budget.
pub struct PollDriver<'a, E: ProbeExecutor + ?Sized> {
    executor: &'a E,
    settings: PollSettings,
}

impl<'a, E: ProbeExecutor + ?Sized> PollDriver<'a, E> {
    pub fn new(executor: &'a E, settings: PollSettings) -> Self {
        Self { executor, settings }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Poll a single probe.
    pub async fn poll(
        &self,
        probe: &ProbeRequest,
        condition: &ConditionSpec,
    ) -> Result<PollOutcome, PollError> {
        self.poll_all(std::slice::from_ref(probe), condition).await
    }

    /// Poll a group of probes that must all succeed in the same attempt.
    ///
    /// Every probe of an attempt runs even after one fails, so the
    /// diagnostic names all failing commands.
    pub async fn poll_all(
        &self,
        probes: &[ProbeRequest],
        condition: &ConditionSpec,
    ) -> Result<PollOutcome, PollError> {
        let deadline = Instant::now() + self.settings.timeout;
        let mut attempts: u32 = 0;
        let mut diagnostic: Option<String> = None;
        let mut last_payload: Option<String> = None;

        loop {
            if Instant::now() >= deadline {
                return Ok(PollOutcome::TimedOut {
                    diagnostic: diagnostic.unwrap_or_else(|| NO_ATTEMPT_DIAGNOSTIC.to_string()),
                    last_payload,
                    attempts,
                });
            }

            attempts += 1;
            match self.attempt(probes, condition, attempts).await? {
                Attempt::Done(outcome) => return Ok(outcome),
                Attempt::Retry {
                    diagnostic: d,
                    payload,
                } => {
                    warn!("Attempt {} of '{}' not done: {}", attempts, describe(probes), d);
                    diagnostic = Some(d);
                    if payload.is_some() {
                        last_payload = payload;
                    }
                }
            }

            if self
                .settings
                .max_attempts
                .is_some_and(|max| attempts >= max)
            {
                return Ok(PollOutcome::TimedOut {
                    diagnostic: diagnostic.unwrap_or_else(|| NO_ATTEMPT_DIAGNOSTIC.to_string()),
                    last_payload,
                    attempts,
                });
            }

            tokio::time::sleep(self.settings.delay).await;
        }
    }

    async fn attempt(
        &self,
        probes: &[ProbeRequest],
        condition: &ConditionSpec,
        attempts: u32,
    ) -> Result<Attempt, PollError> {
        let mut stdout = Vec::with_capacity(probes.len());
        let mut errors = Vec::new();

        for probe in probes {
            let result = self.executor.execute(probe).await?;
            match classify(result) {
                Classified::Success(out) => stdout.push(out),
                Classified::RetryableError(stderr) => {
                    debug!("'{}' failed: {}", probe, stderr);
                    errors.push(stderr);
                }
            }
        }

        if !errors.is_empty() {
            return Ok(Attempt::Retry {
                diagnostic: errors.join("; "),
                payload: None,
            });
        }

        let payload = stdout.join("\n");
        match evaluate(&payload, condition) {
            Evaluation::Matched(value) => {
                info!("'{}' matched after {} attempt(s)", describe(probes), attempts);
                Ok(Attempt::Done(PollOutcome::Matched { value, attempts }))
            }
            Evaluation::Mismatched(detail) => Ok(Attempt::Retry {
                diagnostic: detail,
                payload: Some(payload),
            }),
            Evaluation::ParseError(detail) => Err(PollError::PayloadParse {
                command: describe(probes),
                detail,
            }),
        }
    }
}

fn describe(probes: &[ProbeRequest]) -> String {
    probes
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" && ")
}
